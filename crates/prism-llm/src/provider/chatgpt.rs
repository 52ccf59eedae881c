//! ChatGPT subscription backend (OAuth)
//!
//! Rides a subscription login instead of an API key: the embedded
//! authenticator runs the device-code flow and the resulting bearer is
//! paired with the account id decoded from its claims. The backend only
//! streams and never persists responses, and reasoning continuity
//! depends on `encrypted_content` items surviving the round trip intact.

use async_trait::async_trait;
use http::HeaderMap;
use http::header::HeaderValue;
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, RequestContext};
use prism_oauth::{Authenticator, DeviceFlowSpec, TokenStore};
use serde_json::Value;
use url::Url;

use super::base::{AuthScheme, BaseConfig, BaseStatics};
use super::{ProviderConfig, ProviderKind};
use crate::error::LlmError;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

const STATICS: BaseStatics = BaseStatics {
    env_key_var: "CHATGPT_ACCESS_TOKEN",
    env_base_var: "CHATGPT_API_BASE",
    default_base: Some("https://chatgpt.com/backend-api/codex"),
    path_suffix: "/responses",
    auth_scheme: AuthScheme::Bearer,
    api_key_fallback: None,
};

/// Device-code flow endpoints for the subscription login
const FLOW: DeviceFlowSpec = DeviceFlowSpec {
    slug: "chatgpt",
    client_id: "app_prism_gateway",
    device_auth_url: "https://auth.openai.com/oauth/device/authorization",
    poll_url: "https://auth.openai.com/oauth/device/token",
    token_url: "https://auth.openai.com/oauth/token",
    scope: "openid profile offline_access",
    account_id_claim: &["https://api.openai.com/auth", "chatgpt_account_id"],
};

/// Optional parameters the backend accepts
///
/// `store` is listed so callers sending it are not rejected, but the
/// transformed body always forces it off.
const CHATGPT_SUPPORTED: &[&str] = &[
    "include",
    "instructions",
    "metadata",
    "reasoning",
    "store",
    "text",
    "tool_choice",
    "tools",
];

/// Keys the endpoint accepts in a request body
const CHATGPT_BODY_KEYS: &[&str] = &[
    "include",
    "instructions",
    "metadata",
    "reasoning",
    "store",
    "text",
    "tool_choice",
    "tools",
];

/// ChatGPT provider config
pub struct ChatGptConfig {
    base: BaseConfig,
    authenticator: Authenticator,
}

impl ChatGptConfig {
    /// Build from optional deployment configuration and a token store
    #[must_use]
    pub fn new(entry: Option<&ProviderEntry>, store: TokenStore) -> Self {
        Self {
            base: BaseConfig::new(ProviderKind::Chatgpt, STATICS, entry),
            authenticator: Authenticator::new(FLOW, store),
        }
    }
}

#[async_trait]
impl ProviderConfig for ChatGptConfig {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Chatgpt
    }

    fn supported_params(&self, _model: &str) -> Vec<&'static str> {
        CHATGPT_SUPPORTED.to_vec()
    }

    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError> {
        self.base.filter_supported(params, model, drop_params, CHATGPT_SUPPORTED)
    }

    async fn validate_environment(
        &self,
        headers: HeaderMap,
        _model: &str,
        overrides: &CallOverrides,
        context: &RequestContext,
    ) -> Result<HeaderMap, LlmError> {
        let mut headers = self.base.standard_headers(headers, overrides, context);

        // A pre-supplied token (override or env) skips the login flow
        if headers.contains_key(http::header::AUTHORIZATION) {
            return Ok(headers);
        }

        let token = self.authenticator.access_token().await?;
        AuthScheme::Bearer.apply(&mut headers, &secrecy::SecretString::from(token.token));

        if let Some(account_id) = &token.account_id
            && let Ok(value) = HeaderValue::from_str(account_id)
        {
            headers.insert("chatgpt-account-id", value);
        }

        Ok(headers)
    }

    fn complete_url(&self, overrides: &CallOverrides) -> Result<Url, LlmError> {
        self.base.resolve_url(overrides)
    }

    /// Forces the backend's invariants onto the body: always streaming,
    /// never stored, encrypted reasoning included so multi-turn
    /// conversations keep their reasoning state
    fn transform_request(
        &self,
        model: &str,
        input: &ResponseInput,
        params: OptionalParams,
        _overrides: &CallOverrides,
    ) -> Result<Value, LlmError> {
        let mut body = self.base.build_body(model, input, params, CHATGPT_BODY_KEYS);
        let map = body.as_object_mut().expect("body is always an object");

        map.insert("stream".to_owned(), Value::Bool(true));
        map.insert("store".to_owned(), Value::Bool(false));

        if map.get("include").is_none_or(Value::is_null) {
            map.insert(
                "include".to_owned(),
                serde_json::json!(["reasoning.encrypted_content"]),
            );
        }

        Ok(body)
    }

    /// Responses arrive SSE-framed even for blocking calls
    fn transform_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError> {
        self.base.parse_sse_response(status, body)
    }

    fn transform_stream_chunk(&self, chunk: Value) -> Result<ResponseStreamEvent, LlmError> {
        self.base.chunk_to_event(chunk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InputItem;

    fn config() -> ChatGptConfig {
        let dir = tempfile::tempdir().unwrap();
        ChatGptConfig::new(None, TokenStore::new(Some(dir.path().to_path_buf())))
    }

    #[test]
    fn stream_and_store_are_forced() {
        let body = config()
            .transform_request(
                "gpt-5",
                &ResponseInput::Text("hi".to_owned()),
                OptionalParams::new(),
                &CallOverrides::default(),
            )
            .unwrap();

        assert_eq!(body["stream"], Value::Bool(true));
        assert_eq!(body["store"], Value::Bool(false));
        assert_eq!(body["include"], serde_json::json!(["reasoning.encrypted_content"]));
    }

    #[test]
    fn encrypted_reasoning_input_survives_transformation() {
        let input = ResponseInput::Items(vec![
            InputItem::Message {
                role: "user".to_owned(),
                content: Value::String("continue".to_owned()),
            },
            InputItem::Reasoning {
                id: Some("rs_1".to_owned()),
                summary: None,
                encrypted_content: Some("gAAAA-opaque".to_owned()),
            },
        ]);

        let body = config()
            .transform_request("gpt-5", &input, OptionalParams::new(), &CallOverrides::default())
            .unwrap();

        assert_eq!(body["input"][1]["encrypted_content"], "gAAAA-opaque");
    }

    #[test]
    fn caller_include_list_is_respected() {
        let mut params = OptionalParams::new();
        params.insert("include", serde_json::json!(["reasoning.encrypted_content", "message.output_text.logprobs"]));

        let body = config()
            .transform_request("gpt-5", &ResponseInput::Text("hi".to_owned()), params, &CallOverrides::default())
            .unwrap();

        assert_eq!(body["include"].as_array().unwrap().len(), 2);
    }
}
