//! Manus agent task provider
//!
//! Task-based backend with three quirks: every request runs in agent
//! mode with a profile taken from the model string, the endpoint answers
//! with an event stream even for blocking calls, and the credential
//! header is the bare `API_KEY` scheme rather than a bearer.

use async_trait::async_trait;
use http::HeaderMap;
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, RequestContext};
use serde_json::Value;
use url::Url;

use super::base::{AuthScheme, BaseConfig, BaseStatics};
use super::{ProviderConfig, ProviderKind};
use crate::error::LlmError;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

const STATICS: BaseStatics = BaseStatics {
    env_key_var: "MANUS_API_KEY",
    env_base_var: "MANUS_API_BASE",
    default_base: Some("https://api.manus.ai"),
    path_suffix: "/v1/responses",
    auth_scheme: AuthScheme::UpperApiKey,
    api_key_fallback: None,
};

/// Optional parameters the task endpoint accepts
const MANUS_SUPPORTED: &[&str] = &["metadata", "tools"];

/// Keys the endpoint accepts in a request body, including the injected
/// task fields
const MANUS_BODY_KEYS: &[&str] = &["task_mode", "agent_profile", "metadata", "tools"];

/// Manus provider config
pub struct ManusConfig {
    base: BaseConfig,
}

impl ManusConfig {
    /// Build from optional deployment configuration
    #[must_use]
    pub fn new(entry: Option<&ProviderEntry>) -> Self {
        Self {
            base: BaseConfig::new(ProviderKind::Manus, STATICS, entry),
        }
    }

    /// Split `model` into the task model and its agent profile
    ///
    /// `manus-1.5/high` runs model `manus-1.5` with profile `high`; a
    /// bare model name runs the `standard` profile.
    fn split_profile(model: &str) -> (&str, &str) {
        model.split_once('/').unwrap_or((model, "standard"))
    }
}

#[async_trait]
impl ProviderConfig for ManusConfig {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Manus
    }

    fn supported_params(&self, _model: &str) -> Vec<&'static str> {
        MANUS_SUPPORTED.to_vec()
    }

    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError> {
        self.base.filter_supported(params, model, drop_params, MANUS_SUPPORTED)
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

    /// Builds the task body: agent mode and profile are injected, and
    /// `stream`/`store` are forced regardless of what the caller sent —
    /// the endpoint only runs streaming, non-persisted tasks
    fn transform_request(
        &self,
        model: &str,
        input: &ResponseInput,
        params: OptionalParams,
        _overrides: &CallOverrides,
    ) -> Result<Value, LlmError> {
        let (task_model, agent_profile) = Self::split_profile(model);

        let mut body = self.base.build_body(task_model, input, params, MANUS_BODY_KEYS);
        let map = body.as_object_mut().expect("body is always an object");

        map.insert("task_mode".to_owned(), Value::String("agent".to_owned()));
        map.insert("agent_profile".to_owned(), Value::String(agent_profile.to_owned()));
        map.insert("stream".to_owned(), Value::Bool(true));
        map.insert("store".to_owned(), Value::Bool(false));

        Ok(body)
    }

    /// The endpoint frames every answer as SSE; a blocking call is the
    /// stream collapsed to its terminal event
    fn transform_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError> {
        self.base.parse_sse_response(status, body)
    }

    fn transform_stream_chunk(&self, chunk: Value) -> Result<ResponseStreamEvent, LlmError> {
        self.base.chunk_to_event(chunk)
    }
}
