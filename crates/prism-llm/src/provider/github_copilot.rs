//! GitHub Copilot provider (device-code OAuth)
//!
//! Copilot authenticates through the device-code flow and expects editor
//! identification headers alongside the bearer.

use async_trait::async_trait;
use http::HeaderMap;
use http::header::HeaderValue;
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, RequestContext};
use prism_oauth::{Authenticator, DeviceFlowSpec, TokenStore};
use serde_json::Value;
use url::Url;

use super::base::{AuthScheme, BASE_SUPPORTED_PARAMS, BaseConfig, BaseStatics};
use super::{ProviderConfig, ProviderKind};
use crate::error::LlmError;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

const STATICS: BaseStatics = BaseStatics {
    env_key_var: "GITHUB_COPILOT_ACCESS_TOKEN",
    env_base_var: "GITHUB_COPILOT_API_BASE",
    default_base: Some("https://api.githubcopilot.com"),
    path_suffix: "/responses",
    auth_scheme: AuthScheme::Bearer,
    api_key_fallback: None,
};

/// Device-code flow endpoints for the GitHub login
const FLOW: DeviceFlowSpec = DeviceFlowSpec {
    slug: "github_copilot",
    client_id: "Iv1.b507a08c87ecfe98",
    device_auth_url: "https://github.com/login/device/code",
    poll_url: "https://github.com/login/device/token",
    token_url: "https://github.com/login/oauth/access_token",
    scope: "read:user",
    account_id_claim: &["account_id"],
};

/// Editor identification Copilot expects on every call
const EDITOR_VERSION: &str = "prism/0.1.0";
const INTEGRATION_ID: &str = "prism-gateway";

/// Parameters the Copilot endpoint rejects
const COPILOT_UNSUPPORTED: &[&str] = &["background", "prompt_cache_key", "store", "user"];

/// GitHub Copilot provider config
pub struct GithubCopilotConfig {
    base: BaseConfig,
    authenticator: Authenticator,
}

impl GithubCopilotConfig {
    /// Build from optional deployment configuration and a token store
    #[must_use]
    pub fn new(entry: Option<&ProviderEntry>, store: TokenStore) -> Self {
        Self {
            base: BaseConfig::new(ProviderKind::GithubCopilot, STATICS, entry),
            authenticator: Authenticator::new(FLOW, store),
        }
    }
}

#[async_trait]
impl ProviderConfig for GithubCopilotConfig {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GithubCopilot
    }

    fn supported_params(&self, _model: &str) -> Vec<&'static str> {
        BASE_SUPPORTED_PARAMS
            .iter()
            .copied()
            .filter(|param| !COPILOT_UNSUPPORTED.contains(param))
            .collect()
    }

    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError> {
        let supported = self.supported_params(model);
        self.base.filter_supported(params, model, drop_params, &supported)
    }

    async fn validate_environment(
        &self,
        headers: HeaderMap,
        _model: &str,
        overrides: &CallOverrides,
        context: &RequestContext,
    ) -> Result<HeaderMap, LlmError> {
        let mut headers = self.base.standard_headers(headers, overrides, context);

        headers.insert("editor-version", HeaderValue::from_static(EDITOR_VERSION));
        headers.insert("copilot-integration-id", HeaderValue::from_static(INTEGRATION_ID));

        // A pre-supplied token (override or env) skips the login flow
        if headers.contains_key(http::header::AUTHORIZATION) {
            return Ok(headers);
        }

        let token = self.authenticator.access_token().await?;
        AuthScheme::Bearer.apply(&mut headers, &secrecy::SecretString::from(token.token));

        Ok(headers)
    }

    fn complete_url(&self, overrides: &CallOverrides) -> Result<Url, LlmError> {
        self.base.resolve_url(overrides)
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
