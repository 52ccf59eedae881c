//! Table-driven configs for OpenAI-compatible backends
//!
//! Many backends speak the OpenAI wire format and differ only in slug,
//! environment variables, endpoint, and streaming support. One generic
//! type over a static per-provider record covers them all without a
//! bespoke implementation each.

use async_trait::async_trait;
use http::HeaderMap;
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, RequestContext};
use serde_json::Value;
use url::Url;

use super::base::{AuthScheme, BASE_SUPPORTED_PARAMS, BaseConfig, BaseStatics};
use super::{ProviderCapabilities, ProviderConfig, ProviderKind};
use crate::error::LlmError;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

/// Static identity of one OpenAI-compatible backend
#[derive(Debug, Clone, Copy)]
pub struct OpenAiLikeSpec {
    /// Provider family this record serves
    pub kind: ProviderKind,
    /// Base statics (env vars, endpoint, auth scheme)
    pub statics: BaseStatics,
    /// Whether the backend streams natively
    pub native_streaming: bool,
}

/// Self-hosted vLLM: no real default endpoint, and the server requires a
/// non-empty key header even though it ignores the value
pub static HOSTED_VLLM: OpenAiLikeSpec = OpenAiLikeSpec {
    kind: ProviderKind::HostedVllm,
    statics: BaseStatics {
        env_key_var: "HOSTED_VLLM_API_KEY",
        env_base_var: "HOSTED_VLLM_API_BASE",
        default_base: None,
        path_suffix: "/v1/responses",
        auth_scheme: AuthScheme::Bearer,
        api_key_fallback: Some("fake-api-key"),
    },
    native_streaming: true,
};

/// Downstream LiteLLM-compatible proxy
pub static LITELLM_PROXY: OpenAiLikeSpec = OpenAiLikeSpec {
    kind: ProviderKind::LitellmProxy,
    statics: BaseStatics {
        env_key_var: "LITELLM_PROXY_API_KEY",
        env_base_var: "LITELLM_PROXY_API_BASE",
        default_base: None,
        path_suffix: "/v1/responses",
        auth_scheme: AuthScheme::Bearer,
        api_key_fallback: None,
    },
    native_streaming: true,
};

/// Generic OpenAI-compatible provider config
pub struct OpenAiLikeConfig {
    spec: &'static OpenAiLikeSpec,
    base: BaseConfig,
}

impl OpenAiLikeConfig {
    /// Build from a static record plus optional deployment configuration
    #[must_use]
    pub fn new(spec: &'static OpenAiLikeSpec, entry: Option<&ProviderEntry>) -> Self {
        Self {
            spec,
            base: BaseConfig::new(spec.kind, spec.statics, entry),
        }
    }
}

#[async_trait]
impl ProviderConfig for OpenAiLikeConfig {
    fn kind(&self) -> ProviderKind {
        self.spec.kind
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: self.spec.native_streaming,
            tool_calling: true,
        }
    }

    fn supported_params(&self, _model: &str) -> Vec<&'static str> {
        BASE_SUPPORTED_PARAMS.to_vec()
    }

    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError> {
        self.base.filter_supported(params, model, drop_params, BASE_SUPPORTED_PARAMS)
    }

    async fn validate_environment(
        &self,
        headers: HeaderMap,
        _model: &str,
        overrides: &CallOverrides,
        context: &RequestContext,
    ) -> Result<HeaderMap, LlmError> {
        Ok(self.base.standard_headers(headers, overrides, context))
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
        Ok(self.base.build_body(model, input, params, BASE_SUPPORTED_PARAMS))
    }

    fn transform_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError> {
        self.base.parse_json_response(status, body)
    }

    fn transform_stream_chunk(&self, chunk: Value) -> Result<ResponseStreamEvent, LlmError> {
        self.base.chunk_to_event(chunk)
    }

    fn should_fake_stream(&self, _model: &str, stream: bool) -> bool {
        stream && !self.spec.native_streaming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::AUTHORIZATION;

    #[test]
    fn hosted_vllm_falls_back_to_placeholder_key() {
        temp_env::with_var_unset("HOSTED_VLLM_API_KEY", || {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let config = OpenAiLikeConfig::new(&HOSTED_VLLM, None);

            let headers = runtime
                .block_on(config.validate_environment(
                    HeaderMap::new(),
                    "qwen",
                    &CallOverrides::default(),
                    &RequestContext::empty(),
                ))
                .unwrap();

            assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer fake-api-key");
        });
    }

    #[test]
    fn hosted_vllm_requires_a_base_url() {
        temp_env::with_var_unset("HOSTED_VLLM_API_BASE", || {
            let config = OpenAiLikeConfig::new(&HOSTED_VLLM, None);
            let err = config.complete_url(&CallOverrides::default()).unwrap_err();
            assert!(matches!(err, LlmError::InvalidRequest(_)));
        });
    }

    #[test]
    fn explicit_base_gets_v1_responses_suffix() {
        let overrides = CallOverrides {
            api_base: Some("http://localhost:8000".to_owned()),
            ..CallOverrides::default()
        };

        let config = OpenAiLikeConfig::new(&HOSTED_VLLM, None);
        let url = config.complete_url(&overrides).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/v1/responses");
    }
}
