//! Provider transformation contract and per-provider implementations

pub mod azure;
mod base;
pub mod chatgpt;
pub mod github_copilot;
pub mod manus;
pub mod openai;
pub mod openai_like;
pub mod perplexity;
pub mod xai;

use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, RequestContext};
use prism_oauth::TokenStore;
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use url::Url;

pub use base::{AuthScheme, BaseConfig, BaseStatics};

use crate::error::LlmError;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

/// Upstream provider families this gateway can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI platform API
    Openai,
    /// Azure OpenAI and Azure AI Foundry deployments
    Azure,
    /// xAI API
    Xai,
    /// Perplexity API
    Perplexity,
    /// Manus agent task API
    Manus,
    /// ChatGPT subscription backend (OAuth)
    Chatgpt,
    /// GitHub Copilot API (device-code OAuth)
    GithubCopilot,
    /// Self-hosted vLLM deployments
    HostedVllm,
    /// Another LiteLLM-compatible proxy
    LitellmProxy,
}

impl ProviderKind {
    /// Split a possibly provider-prefixed model string
    ///
    /// `azure/gpt-4o` targets Azure with model `gpt-4o`; a bare model
    /// string goes to OpenAI. An unrecognized prefix is an error rather
    /// than a guess.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::ProviderNotFound`] for an unknown prefix.
    pub fn split_model(model: &str) -> Result<(Self, &str), LlmError> {
        match model.split_once('/') {
            None => Ok((Self::Openai, model)),
            Some((prefix, rest)) => prefix.parse().map(|kind| (kind, rest)).map_err(|_| {
                LlmError::ProviderNotFound {
                    provider: prefix.to_owned(),
                }
            }),
        }
    }

    /// Stable slug used in configs, logs, and error messages
    #[must_use]
    pub fn slug(self) -> &'static str {
        self.into()
    }
}

/// Capabilities advertised by a provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderCapabilities {
    /// Whether the provider supports token-level streaming
    pub streaming: bool,
    /// Whether the provider supports tool/function calling
    pub tool_calling: bool,
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            streaming: true,
            tool_calling: true,
        }
    }
}

/// Transformation contract every provider implements
///
/// Implementations are stateless across requests; the only embedded
/// state is an [`prism_oauth::Authenticator`] for OAuth providers, whose
/// persistence lives outside the config object.
#[async_trait]
pub trait ProviderConfig: Send + Sync {
    /// Which provider family this config serves
    fn kind(&self) -> ProviderKind;

    /// Advertised capabilities
    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    /// Parameter names this provider accepts for `model`
    fn supported_params(&self, model: &str) -> Vec<&'static str>;

    /// Map canonical optional parameters into the provider's shapes
    ///
    /// Drops or rejects unsupported keys per `drop_params`, applies
    /// value-level constraints, and reshapes structured tools.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnsupportedParam`] or
    /// [`LlmError::UnsupportedParamValue`] when `drop_params` is false
    /// and the request carries something this provider cannot accept.
    fn map_params(&self, params: OptionalParams, model: &str, drop_params: bool) -> Result<OptionalParams, LlmError>;

    /// Resolve credentials and inject this provider's auth headers
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Authentication`] when an OAuth flow fails;
    /// a missing static key leaves headers unset instead of erroring.
    async fn validate_environment(
        &self,
        headers: HeaderMap,
        model: &str,
        overrides: &CallOverrides,
        context: &RequestContext,
    ) -> Result<HeaderMap, LlmError>;

    /// Resolve the complete target URL for this call
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidRequest`] when no base URL can be
    /// resolved from overrides, configuration, environment, or defaults.
    fn complete_url(&self, overrides: &CallOverrides) -> Result<Url, LlmError>;

    /// Build the provider's JSON request body
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidRequest`] when the input cannot be
    /// rendered for this provider.
    fn transform_request(
        &self,
        model: &str,
        input: &ResponseInput,
        params: OptionalParams,
        overrides: &CallOverrides,
    ) -> Result<Value, LlmError>;

    /// Parse a raw provider response into the canonical schema
    ///
    /// # Errors
    ///
    /// Returns a typed error carrying the upstream status for non-2xx
    /// responses and unparseable bodies.
    fn transform_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError>;

    /// Convert one parsed stream chunk into a canonical event
    ///
    /// Cosmetic omissions are coalesced, not rejected; unknown event
    /// types pass through.
    ///
    /// # Errors
    ///
    /// Reserved for chunks that cannot be represented at all.
    fn transform_stream_chunk(&self, chunk: Value) -> Result<ResponseStreamEvent, LlmError>;

    /// Whether a streaming request must be emulated from a blocking call
    fn should_fake_stream(&self, _model: &str, _stream: bool) -> bool {
        false
    }
}

/// Construct the config object for a provider kind
///
/// `entry` carries deployment configuration when the operator declared
/// one; without it the provider runs on environment variables alone.
#[must_use]
pub fn build_provider(
    kind: ProviderKind,
    entry: Option<&ProviderEntry>,
    store: &TokenStore,
) -> Arc<dyn ProviderConfig> {
    match kind {
        ProviderKind::Openai => Arc::new(openai::OpenAiConfig::new(entry)),
        ProviderKind::Azure => Arc::new(azure::AzureConfig::new(entry)),
        ProviderKind::Xai => Arc::new(xai::XaiConfig::new(entry)),
        ProviderKind::Perplexity => Arc::new(perplexity::PerplexityConfig::new(entry)),
        ProviderKind::Manus => Arc::new(manus::ManusConfig::new(entry)),
        ProviderKind::Chatgpt => Arc::new(chatgpt::ChatGptConfig::new(entry, store.clone())),
        ProviderKind::GithubCopilot => Arc::new(github_copilot::GithubCopilotConfig::new(entry, store.clone())),
        ProviderKind::HostedVllm => Arc::new(openai_like::OpenAiLikeConfig::new(&openai_like::HOSTED_VLLM, entry)),
        ProviderKind::LitellmProxy => Arc::new(openai_like::OpenAiLikeConfig::new(&openai_like::LITELLM_PROXY, entry)),
    }
}
