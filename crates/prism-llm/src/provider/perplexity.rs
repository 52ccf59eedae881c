//! Perplexity provider
//!
//! Search-native models with a narrower parameter surface: no system
//! `instructions`, no response chaining, no background mode. The
//! deep-research models only run as asynchronous tasks upstream, so
//! streaming them is emulated from the blocking call.

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

const STATICS: BaseStatics = BaseStatics {
    env_key_var: "PERPLEXITY_API_KEY",
    env_base_var: "PERPLEXITY_API_BASE",
    default_base: Some("https://api.perplexity.ai"),
    path_suffix: "/responses",
    auth_scheme: AuthScheme::Bearer,
    api_key_fallback: None,
};

/// Parameters the Perplexity endpoint rejects
const PERPLEXITY_UNSUPPORTED: &[&str] = &[
    "background",
    "include",
    "instructions",
    "parallel_tool_calls",
    "previous_response_id",
    "prompt_cache_key",
    "store",
    "tool_choice",
    "tools",
    "truncation",
];

/// Whether this model runs as an asynchronous task without native
/// streaming
fn is_deep_research(model: &str) -> bool {
    model.contains("deep-research")
}

/// Perplexity provider config
pub struct PerplexityConfig {
    base: BaseConfig,
}

impl PerplexityConfig {
    /// Build from optional deployment configuration
    #[must_use]
    pub fn new(entry: Option<&ProviderEntry>) -> Self {
        Self {
            base: BaseConfig::new(ProviderKind::Perplexity, STATICS, entry),
        }
    }
}

#[async_trait]
impl ProviderConfig for PerplexityConfig {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Perplexity
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            streaming: true,
            tool_calling: false,
        }
    }

    fn supported_params(&self, _model: &str) -> Vec<&'static str> {
        BASE_SUPPORTED_PARAMS
            .iter()
            .copied()
            .filter(|param| !PERPLEXITY_UNSUPPORTED.contains(param))
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
        let supported = self.supported_params(model);
        Ok(self.base.build_body(model, input, params, &supported))
    }

    fn transform_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError> {
        self.base.parse_json_response(status, body)
    }

    fn transform_stream_chunk(&self, chunk: Value) -> Result<ResponseStreamEvent, LlmError> {
        self.base.chunk_to_event(chunk)
    }

    fn should_fake_stream(&self, model: &str, stream: bool) -> bool {
        stream && is_deep_research(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instructions_are_rejected_or_dropped() {
        let config = PerplexityConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert("instructions", Value::from("be terse"));

        let err = config.map_params(params.clone(), "sonar-pro", false).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedParam { param, .. } if param == "instructions"));

        let dropped = config.map_params(params, "sonar-pro", true).unwrap();
        assert!(!dropped.contains("instructions"));
    }

    #[test]
    fn temperature_is_still_supported() {
        let config = PerplexityConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert("temperature", Value::from(0.3));

        let mapped = config.map_params(params, "sonar-pro", false).unwrap();
        assert_eq!(mapped.get("temperature"), Some(&Value::from(0.3)));
    }

    #[test]
    fn deep_research_models_fake_stream() {
        let config = PerplexityConfig::new(None);
        assert!(config.should_fake_stream("sonar-deep-research", true));
        assert!(!config.should_fake_stream("sonar-deep-research", false));
        assert!(!config.should_fake_stream("sonar-pro", true));
    }
}
