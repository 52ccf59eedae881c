//! Azure OpenAI / Azure AI Foundry provider
//!
//! Distinct from the OpenAI provider in three ways: the credential walks
//! the extended Entra ID identity chain, the auth header is `api-key`
//! rather than a bearer, and the endpoint path depends on which Azure
//! host family the deployment lives on.

use async_trait::async_trait;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, RequestContext};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use super::base::{AuthScheme, BASE_SUPPORTED_PARAMS, BaseConfig, BaseStatics};
use super::{ProviderConfig, ProviderKind};
use crate::error::LlmError;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

const STATICS: BaseStatics = BaseStatics {
    env_key_var: "AZURE_API_KEY",
    env_base_var: "AZURE_API_BASE",
    default_base: None,
    path_suffix: "/openai/responses",
    auth_scheme: AuthScheme::AzureApiKey,
    api_key_fallback: None,
};

/// Sampling parameters the o-series reasoning models reject outright
const O_SERIES_UNSUPPORTED: &[&str] = &["temperature", "top_p"];

/// Whether a deployment name targets an o-series reasoning model
fn is_o_series(model: &str) -> bool {
    let mut chars = model.chars();
    chars.next() == Some('o') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Azure provider config
pub struct AzureConfig {
    base: BaseConfig,
    http: Client,
}

impl AzureConfig {
    /// Build from optional deployment configuration
    #[must_use]
    pub fn new(entry: Option<&ProviderEntry>) -> Self {
        Self {
            base: BaseConfig::new(ProviderKind::Azure, STATICS, entry),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl ProviderConfig for AzureConfig {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn supported_params(&self, model: &str) -> Vec<&'static str> {
        let mut supported = BASE_SUPPORTED_PARAMS.to_vec();
        if is_o_series(model) {
            supported.retain(|param| !O_SERIES_UNSUPPORTED.contains(param));
            supported.push("reasoning");
        }
        supported
    }

    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError> {
        let supported = self.supported_params(model);
        self.base.filter_supported(params, model, drop_params, &supported)
    }

    /// Identity chain, tried in order: explicit AD token, API key,
    /// Entra ID grants (client credential, password, OIDC exchange,
    /// managed identity), environment variable. Each tier falls through
    /// silently; only a fully empty chain leaves the request
    /// unauthenticated.
    async fn validate_environment(
        &self,
        mut headers: HeaderMap,
        _model: &str,
        overrides: &CallOverrides,
        context: &RequestContext,
    ) -> Result<HeaderMap, LlmError> {
        if let Some(token) = &overrides.azure.ad_token {
            headers = self.base.standard_headers(headers, overrides, context);
            AuthScheme::Bearer.apply(&mut headers, token);
            headers.remove("api-key");
            return Ok(headers);
        }

        if self.base.resolve_api_key(overrides, context).is_some() {
            // standard_headers re-resolves and applies the api-key scheme
            return Ok(self.base.standard_headers(headers, overrides, context));
        }

        if !overrides.azure.is_empty()
            && let Some(token) = prism_oauth::azure::resolve_entra_token(&self.http, &overrides.azure).await
        {
            headers = self.base.standard_headers(headers, overrides, context);
            AuthScheme::Bearer.apply(&mut headers, &token);
            return Ok(headers);
        }

        // Every tier exhausted: emit content type and rules but no
        // credential
        headers.insert(CONTENT_TYPE, http::HeaderValue::from_static("application/json"));
        tracing::debug!(provider = "azure", "identity chain resolved no credential");
        Ok(headers)
    }

    fn complete_url(&self, overrides: &CallOverrides) -> Result<Url, LlmError> {
        let base = overrides
            .api_base
            .clone()
            .or_else(|| {
                self.base
                    .configured_base()
                    .map(|url| url.to_string().trim_end_matches('/').to_owned())
            })
            .or_else(|| std::env::var(STATICS.env_base_var).ok())
            .ok_or_else(|| {
                LlmError::InvalidRequest("no api_base for azure; pass one or set AZURE_API_BASE".to_owned())
            })?;

        let mut url =
            Url::parse(&base).map_err(|e| LlmError::InvalidRequest(format!("invalid api_base '{base}': {e}")))?;

        // A base already pointing at a responses path is used verbatim
        if !url.path().trim_end_matches('/').ends_with("/responses") {
            let suffix = match url.host_str() {
                // AI Foundry serverless endpoints route through /models
                Some(host) if host.ends_with(".services.ai.azure.com") => "/models/responses",
                _ => "/openai/responses",
            };
            let path = url.path().trim_end_matches('/').to_owned();
            url.set_path(&format!("{path}{suffix}"));
        }

        // Merge the api-version query parameter, never overwriting one
        // already present in the base URL
        let has_api_version = url.query_pairs().any(|(key, _)| key == "api-version");
        if !has_api_version {
            if let Some(version) = overrides.api_version.as_deref().or_else(|| self.base.api_version()) {
                url.query_pairs_mut().append_pair("api-version", version);
            }
        }

        Ok(url)
    }

    fn transform_request(
        &self,
        model: &str,
        input: &ResponseInput,
        params: OptionalParams,
        _overrides: &CallOverrides,
    ) -> Result<Value, LlmError> {
        let supported = self.supported_params(model);
        Ok(self.base.build_body(model, input, params, &supported))
    }

    fn transform_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError> {
        self.base.parse_json_response(status, body)
    }

    fn transform_stream_chunk(&self, chunk: Value) -> Result<ResponseStreamEvent, LlmError> {
        self.base.chunk_to_event(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn overrides_with_base(base: &str) -> CallOverrides {
        CallOverrides {
            api_base: Some(base.to_owned()),
            ..CallOverrides::default()
        }
    }

    #[test]
    fn full_responses_url_with_query_is_unchanged() {
        let config = AzureConfig::new(None);
        let overrides = overrides_with_base("https://foo.openai.azure.com/openai/responses?api-version=2024-05-01-preview");

        let url = config.complete_url(&overrides).unwrap();
        assert_eq!(
            url.as_str(),
            "https://foo.openai.azure.com/openai/responses?api-version=2024-05-01-preview"
        );
    }

    #[test]
    fn openai_host_gets_openai_path() {
        let config = AzureConfig::new(None);
        let url = config.complete_url(&overrides_with_base("https://foo.openai.azure.com")).unwrap();
        assert_eq!(url.path(), "/openai/responses");
    }

    #[test]
    fn foundry_host_gets_models_path() {
        let config = AzureConfig::new(None);
        let url = config
            .complete_url(&overrides_with_base("https://foo.services.ai.azure.com"))
            .unwrap();
        assert_eq!(url.path(), "/models/responses");
    }

    #[test]
    fn api_version_override_is_appended_once() {
        let config = AzureConfig::new(None);
        let overrides = CallOverrides {
            api_base: Some("https://foo.openai.azure.com".to_owned()),
            api_version: Some("2025-01-01".to_owned()),
            ..CallOverrides::default()
        };

        let url = config.complete_url(&overrides).unwrap();
        assert_eq!(url.query(), Some("api-version=2025-01-01"));
    }

    #[test]
    fn o_series_drops_sampling_params() {
        let config = AzureConfig::new(None);
        let supported = config.supported_params("o3-mini");
        assert!(!supported.contains(&"temperature"));
        assert!(!supported.contains(&"top_p"));
        assert!(supported.contains(&"reasoning"));

        let mut params = OptionalParams::new();
        params.insert("temperature", Value::from(0.5));

        let err = config.map_params(params.clone(), "o3-mini", false).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedParam { param, .. } if param == "temperature"));

        let dropped = config.map_params(params, "o3-mini", true).unwrap();
        assert!(!dropped.contains("temperature"));
    }

    #[test]
    fn gpt4_deployment_keeps_sampling_params() {
        let config = AzureConfig::new(None);
        assert!(config.supported_params("gpt-4o").contains(&"temperature"));
    }

    #[tokio::test]
    async fn ad_token_wins_over_api_key() {
        let config = AzureConfig::new(None);
        let overrides = CallOverrides {
            api_key: Some(SecretString::from("sk-azure")),
            azure: prism_core::AzureCredentials {
                ad_token: Some(SecretString::from("entra-token")),
                ..prism_core::AzureCredentials::default()
            },
            ..CallOverrides::default()
        };

        let headers = config
            .validate_environment(HeaderMap::new(), "gpt-4o", &overrides, &RequestContext::empty())
            .await
            .unwrap();

        assert_eq!(headers.get("authorization").unwrap(), "Bearer entra-token");
        assert!(headers.get("api-key").is_none());
    }

    #[tokio::test]
    async fn api_key_sets_azure_header_scheme() {
        let config = AzureConfig::new(None);
        let overrides = CallOverrides {
            api_key: Some(SecretString::from("sk-azure")),
            ..CallOverrides::default()
        };

        let headers = config
            .validate_environment(HeaderMap::new(), "gpt-4o", &overrides, &RequestContext::empty())
            .await
            .unwrap();

        assert_eq!(headers.get("api-key").unwrap(), "sk-azure");
        assert!(headers.get("authorization").is_none());
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }
}
