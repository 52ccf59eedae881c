//! xAI provider
//!
//! Mostly OpenAI-shaped; the live-search tooling uses a filter-based
//! schema, so canonical web-search tools are reshaped field by field.

use async_trait::async_trait;
use http::HeaderMap;
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, RequestContext};
use serde_json::Value;
use url::Url;

use super::base::{AuthScheme, BASE_SUPPORTED_PARAMS, BaseConfig, BaseStatics};
use super::{ProviderConfig, ProviderKind};
use crate::error::LlmError;
use crate::transform::tools;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

const STATICS: BaseStatics = BaseStatics {
    env_key_var: "XAI_API_KEY",
    env_base_var: "XAI_API_BASE",
    default_base: Some("https://api.x.ai/v1"),
    path_suffix: "/responses",
    auth_scheme: AuthScheme::Bearer,
    api_key_fallback: None,
};

/// Parameters the xAI responses endpoint does not take
const XAI_UNSUPPORTED: &[&str] = &["background", "include", "prompt_cache_key", "truncation"];

/// xAI provider config
pub struct XaiConfig {
    base: BaseConfig,
}

impl XaiConfig {
    /// Build from optional deployment configuration
    #[must_use]
    pub fn new(entry: Option<&ProviderEntry>) -> Self {
        Self {
            base: BaseConfig::new(ProviderKind::Xai, STATICS, entry),
        }
    }

    /// Translate canonical web-search tools into the filter schema
    fn map_tools(params: &mut OptionalParams) {
        let Some(Value::Array(raw_tools)) = params.get("tools").cloned() else {
            return;
        };

        let mapped: Vec<Value> = raw_tools
            .into_iter()
            .map(|tool| {
                if tools::is_web_search_tool(&tool)
                    && let Some(map) = tool.as_object()
                {
                    Value::Object(tools::remap_web_search_tool(map))
                } else {
                    tool
                }
            })
            .collect();

        params.insert("tools", Value::Array(mapped));
    }
}

#[async_trait]
impl ProviderConfig for XaiConfig {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Xai
    }

    fn supported_params(&self, _model: &str) -> Vec<&'static str> {
        BASE_SUPPORTED_PARAMS
            .iter()
            .copied()
            .filter(|param| !XAI_UNSUPPORTED.contains(param))
            .collect()
    }

    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError> {
        let supported = self.supported_params(model);
        let mut params = self.base.filter_supported(params, model, drop_params, &supported)?;
        Self::map_tools(&mut params);
        Ok(params)
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_search_tool_is_reshaped_to_filters() {
        let config = XaiConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert(
            "tools",
            serde_json::json!([{
                "type": "web_search",
                "search_context_size": "high",
                "allowed_domains": ["wikipedia.org"]
            }]),
        );

        let mapped = config.map_params(params, "grok-4-fast", false).unwrap();
        let mapped_tools = mapped.get("tools").unwrap().as_array().unwrap();

        assert_eq!(mapped_tools.len(), 1);
        assert_eq!(mapped_tools[0]["type"], "web_search");
        assert!(mapped_tools[0].get("search_context_size").is_none());
        assert_eq!(mapped_tools[0]["filters"]["allowed_domains"], serde_json::json!(["wikipedia.org"]));
    }

    #[test]
    fn function_tools_pass_through_unchanged() {
        let config = XaiConfig::new(None);
        let function_tool = serde_json::json!({ "type": "function", "name": "lookup", "parameters": {} });
        let mut params = OptionalParams::new();
        params.insert("tools", serde_json::json!([function_tool.clone()]));

        let mapped = config.map_params(params, "grok-4-fast", false).unwrap();
        assert_eq!(mapped.get("tools").unwrap()[0], function_tool);
    }

    #[test]
    fn truncation_is_not_supported() {
        let config = XaiConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert("truncation", Value::from("auto"));

        let err = config.map_params(params.clone(), "grok-4-fast", false).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedParam { param, .. } if param == "truncation"));

        let dropped = config.map_params(params, "grok-4-fast", true).unwrap();
        assert!(dropped.is_empty());
    }

    #[test]
    fn default_url_targets_xai() {
        temp_env::with_var_unset("XAI_API_BASE", || {
            let config = XaiConfig::new(None);
            let url = config.complete_url(&CallOverrides::default()).unwrap();
            assert_eq!(url.as_str(), "https://api.x.ai/v1/responses");
        });
    }
}
