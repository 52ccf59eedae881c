//! OpenAI platform provider

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
    env_key_var: "OPENAI_API_KEY",
    env_base_var: "OPENAI_API_BASE",
    default_base: Some("https://api.openai.com/v1"),
    path_suffix: "/responses",
    auth_scheme: AuthScheme::Bearer,
    api_key_fallback: None,
};

/// Whether a model belongs to the GPT-5 family, which constrains
/// sampling parameters and accepts reasoning configuration
fn is_gpt5_family(model: &str) -> bool {
    model.starts_with("gpt-5")
}

/// OpenAI provider config
pub struct OpenAiConfig {
    base: BaseConfig,
}

impl OpenAiConfig {
    /// Build from optional deployment configuration
    #[must_use]
    pub fn new(entry: Option<&ProviderEntry>) -> Self {
        Self {
            base: BaseConfig::new(ProviderKind::Openai, STATICS, entry),
        }
    }

    /// Apply GPT-5 family sampling constraints: only `temperature == 1`
    /// is accepted; other values are rejected or dropped per
    /// `drop_params`
    fn enforce_gpt5_temperature(
        &self,
        params: &mut OptionalParams,
        model: &str,
        drop_params: bool,
    ) -> Result<(), LlmError> {
        let Some(temperature) = params.get("temperature") else {
            return Ok(());
        };

        if temperature.as_f64() == Some(1.0) {
            return Ok(());
        }

        if drop_params {
            tracing::debug!(model, "dropping non-default temperature for gpt-5 family model");
            params.remove("temperature");
            return Ok(());
        }

        Err(LlmError::UnsupportedParamValue {
            param: "temperature".to_owned(),
            value: temperature.to_string(),
            model: model.to_owned(),
            provider: self.base.kind().slug().to_owned(),
        })
    }

    /// Reshape tool definitions into what the endpoint accepts
    fn map_tools(params: &mut OptionalParams) {
        let Some(Value::Array(raw_tools)) = params.get("tools").cloned() else {
            return;
        };

        let mapped: Vec<Value> = raw_tools
            .into_iter()
            .map(|tool| match tool.as_object() {
                Some(map) if tool.get("type").and_then(Value::as_str) == Some("code_interpreter") => {
                    Value::Object(tools::ensure_code_interpreter_container(map))
                }
                _ => tool,
            })
            .collect();

        params.insert("tools", Value::Array(mapped));
    }
}

#[async_trait]
impl ProviderConfig for OpenAiConfig {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Openai
    }

    fn supported_params(&self, model: &str) -> Vec<&'static str> {
        let mut supported = BASE_SUPPORTED_PARAMS.to_vec();
        if is_gpt5_family(model) {
            supported.push("reasoning");
        }
        supported
    }

    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError> {
        let supported = self.supported_params(model);
        let mut params = self.base.filter_supported(params, model, drop_params, &supported)?;

        if is_gpt5_family(model) {
            self.enforce_gpt5_temperature(&mut params, model, drop_params)?;
        }

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
    fn gpt5_family_gains_reasoning_param() {
        let config = OpenAiConfig::new(None);
        assert!(config.supported_params("gpt-5-mini").contains(&"reasoning"));
        assert!(!config.supported_params("gpt-4o").contains(&"reasoning"));
    }

    #[test]
    fn gpt5_rejects_non_default_temperature() {
        let config = OpenAiConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert("temperature", Value::from(0.2));

        let err = config.map_params(params.clone(), "gpt-5", false).unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedParamValue { param, .. } if param == "temperature"));

        let dropped = config.map_params(params, "gpt-5", true).unwrap();
        assert!(!dropped.contains("temperature"));
    }

    #[test]
    fn gpt5_preserves_temperature_of_exactly_one() {
        let config = OpenAiConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert("temperature", Value::from(1.0));

        let strict = config.map_params(params.clone(), "gpt-5", false).unwrap();
        assert_eq!(strict.get("temperature"), Some(&Value::from(1.0)));

        let lenient = config.map_params(params, "gpt-5", true).unwrap();
        assert_eq!(lenient.get("temperature"), Some(&Value::from(1.0)));
    }

    #[test]
    fn other_models_keep_any_temperature() {
        let config = OpenAiConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert("temperature", Value::from(0.2));

        let mapped = config.map_params(params, "gpt-4o", false).unwrap();
        assert_eq!(mapped.get("temperature"), Some(&Value::from(0.2)));
    }

    #[test]
    fn code_interpreter_tool_gains_container() {
        let config = OpenAiConfig::new(None);
        let mut params = OptionalParams::new();
        params.insert("tools", serde_json::json!([{ "type": "code_interpreter" }]));

        let mapped = config.map_params(params, "gpt-4o", false).unwrap();
        assert_eq!(mapped.get("tools").unwrap()[0]["container"]["type"], "auto");
    }

    #[test]
    fn request_body_carries_model_and_input() {
        let config = OpenAiConfig::new(None);
        let body = config
            .transform_request(
                "gpt-4o",
                &ResponseInput::Text("hello".to_owned()),
                OptionalParams::new(),
                &CallOverrides::default(),
            )
            .unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["input"], "hello");
    }
}
