use http::HeaderMap;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use prism_config::ProviderEntry;
use prism_core::{CallOverrides, HeaderRule, RequestContext};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use url::Url;

use super::ProviderKind;
use crate::error::LlmError;
use crate::transform;
use crate::types::{OptionalParams, ResponseInput, ResponseStreamEvent, ResponsesResult};

/// Optional parameters every Responses-shaped endpoint accepts
///
/// Providers subtract from or add to this; model-family extras (like
/// `reasoning`) are appended per model, not globally.
pub const BASE_SUPPORTED_PARAMS: &[&str] = &[
    "background",
    "include",
    "instructions",
    "max_output_tokens",
    "max_tool_calls",
    "metadata",
    "parallel_tool_calls",
    "previous_response_id",
    "prompt_cache_key",
    "store",
    "temperature",
    "text",
    "tool_choice",
    "tools",
    "top_logprobs",
    "top_p",
    "truncation",
    "user",
];

/// Keys allowed in a request body beyond the optional parameters
const BODY_BASE_KEYS: &[&str] = &["model", "input", "stream"];

/// How a provider expects its credential presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `api-key: <token>` (Azure-style)
    AzureApiKey,
    /// `API_KEY: <token>`
    UpperApiKey,
    /// `x-api-key: <token>`
    XApiKey,
}

impl AuthScheme {
    /// Insert the credential into `headers` under this scheme
    pub fn apply(self, headers: &mut HeaderMap, key: &SecretString) {
        if self == Self::Bearer {
            if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", key.expose_secret())) {
                headers.insert(AUTHORIZATION, value);
            }
            return;
        }

        let name = match self {
            Self::Bearer => return,
            Self::AzureApiKey => HeaderName::from_static("api-key"),
            // Header names are case-insensitive; the wire rendering of
            // this one is conventionally uppercase
            Self::UpperApiKey => HeaderName::from_static("api_key"),
            Self::XApiKey => HeaderName::from_static("x-api-key"),
        };

        if let Ok(value) = HeaderValue::from_str(key.expose_secret()) {
            headers.insert(name, value);
        }
    }
}

/// Static identity of a provider family: env var names, endpoint
/// defaults, auth scheme
#[derive(Debug, Clone, Copy)]
pub struct BaseStatics {
    /// Environment variable consulted for the API key
    pub env_key_var: &'static str,
    /// Environment variable consulted for the base URL
    pub env_base_var: &'static str,
    /// Hardcoded endpoint used when nothing else resolves
    pub default_base: Option<&'static str>,
    /// Path appended to the base URL
    pub path_suffix: &'static str,
    /// Credential header scheme
    pub auth_scheme: AuthScheme,
    /// Placeholder key for backends that require a non-empty credential
    /// even when none is meaningful
    pub api_key_fallback: Option<&'static str>,
}

/// Shared default behavior providers delegate to explicitly
///
/// One instance per provider config, holding the deployment's configured
/// values next to the family's static identity.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    kind: ProviderKind,
    statics: BaseStatics,
    configured_key: Option<SecretString>,
    configured_base: Option<Url>,
    api_version: Option<String>,
    header_rules: Vec<HeaderRule>,
    forward_authorization: bool,
}

impl BaseConfig {
    /// Build from the family's statics plus optional deployment config
    #[must_use]
    pub fn new(kind: ProviderKind, statics: BaseStatics, entry: Option<&ProviderEntry>) -> Self {
        Self {
            kind,
            statics,
            configured_key: entry.and_then(|e| e.api_key.clone()),
            configured_base: entry.and_then(|e| e.base_url.clone()),
            api_version: entry.and_then(|e| e.api_version.clone()),
            header_rules: entry.map(|e| parse_header_rules(&e.headers)).unwrap_or_default(),
            forward_authorization: entry.is_some_and(|e| e.forward_authorization),
        }
    }

    /// Provider family this base belongs to
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Deployment-configured API version, if any
    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// Deployment-configured base URL, if any
    #[must_use]
    pub fn configured_base(&self) -> Option<&Url> {
        self.configured_base.as_ref()
    }

    /// Resolve the credential through the standard fallback chain:
    /// explicit per-call key, forwarded caller key, configured key,
    /// environment variable, static placeholder
    #[must_use]
    pub fn resolve_api_key(&self, overrides: &CallOverrides, context: &RequestContext) -> Option<SecretString> {
        if let Some(key) = &overrides.api_key {
            return Some(key.clone());
        }
        if self.forward_authorization
            && let Some(key) = &context.api_key
        {
            return Some(key.clone());
        }
        if let Some(key) = &self.configured_key {
            return Some(key.clone());
        }
        if let Ok(key) = std::env::var(self.statics.env_key_var) {
            return Some(SecretString::from(key));
        }
        self.statics.api_key_fallback.map(SecretString::from)
    }

    /// Standard environment validation: content type, configured header
    /// rules, then the credential under this family's scheme
    ///
    /// A missing credential leaves the auth header unset; the provider
    /// will answer 401 and that error carries more signal than a local
    /// guess.
    #[must_use]
    pub fn standard_headers(
        &self,
        mut headers: HeaderMap,
        overrides: &CallOverrides,
        context: &RequestContext,
    ) -> HeaderMap {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let extra = prism_core::apply_header_rules(context.headers(), &self.header_rules);
        for (name, value) in &extra {
            headers.insert(name.clone(), value.clone());
        }

        if let Some(key) = self.resolve_api_key(overrides, context) {
            self.statics.auth_scheme.apply(&mut headers, &key);
        } else {
            tracing::debug!(provider = self.kind.slug(), "no credential resolved, sending unauthenticated");
        }

        headers
    }

    /// Resolve the endpoint: explicit base, configured base, environment
    /// variable, hardcoded default — then append the family's path
    /// suffix unless the base already names a responses path
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::InvalidRequest`] when nothing resolves or the
    /// base does not parse as a URL.
    pub fn resolve_url(&self, overrides: &CallOverrides) -> Result<Url, LlmError> {
        let base = overrides
            .api_base
            .clone()
            .or_else(|| self.configured_base.as_ref().map(|u| u.to_string().trim_end_matches('/').to_owned()))
            .or_else(|| std::env::var(self.statics.env_base_var).ok())
            .or_else(|| self.statics.default_base.map(ToOwned::to_owned))
            .ok_or_else(|| {
                LlmError::InvalidRequest(format!(
                    "no api_base for {}; pass one or set {}",
                    self.kind.slug(),
                    self.statics.env_base_var
                ))
            })?;

        let mut url =
            Url::parse(&base).map_err(|e| LlmError::InvalidRequest(format!("invalid api_base '{base}': {e}")))?;

        append_suffix_once(&mut url, self.statics.path_suffix);
        Ok(url)
    }

    /// Drop or reject parameters outside `supported`
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::UnsupportedParam`] for the first offending
    /// key when `drop_params` is false.
    pub fn filter_supported(
        &self,
        mut params: OptionalParams,
        model: &str,
        drop_params: bool,
        supported: &[&'static str],
    ) -> Result<OptionalParams, LlmError> {
        let unsupported: Vec<String> = params
            .keys()
            .filter(|key| !supported.contains(key))
            .map(ToOwned::to_owned)
            .collect();

        if unsupported.is_empty() {
            return Ok(params);
        }

        if !drop_params {
            return Err(LlmError::UnsupportedParam {
                param: unsupported[0].clone(),
                model: model.to_owned(),
                provider: self.kind.slug().to_owned(),
            });
        }

        tracing::debug!(
            provider = self.kind.slug(),
            model,
            dropped = ?unsupported,
            "dropping unsupported parameters"
        );
        params.retain(|key| supported.contains(&key));
        Ok(params)
    }

    /// Assemble the request body and restrict it to the keys this
    /// provider's endpoint accepts
    #[must_use]
    pub fn build_body(&self, model: &str, input: &ResponseInput, params: OptionalParams, allowed: &[&'static str]) -> Value {
        let mut map = Map::new();
        map.insert("model".to_owned(), Value::String(model.to_owned()));
        map.insert("input".to_owned(), input.to_wire());
        for (key, value) in params {
            map.insert(key, value);
        }

        let mut body = Value::Object(map);
        let mut all_allowed: Vec<&str> = BODY_BASE_KEYS.to_vec();
        all_allowed.extend_from_slice(allowed);
        transform::filter_body_to_allowed(&mut body, &all_allowed);
        body
    }

    /// Parse a plain-JSON provider response into the canonical schema
    ///
    /// # Errors
    ///
    /// Surfaces provider errors as typed errors carrying the upstream
    /// status; never returns a malformed success object.
    pub fn parse_json_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError> {
        if status >= 400 {
            return Err(LlmError::from_upstream_status(status, transform::extract_error_message(body)));
        }

        let mut value: Value = serde_json::from_str(body).map_err(|e| LlmError::Upstream {
            status,
            message: format!("unparseable response body: {e}"),
        })?;

        transform::normalize_response_value(&mut value);

        serde_json::from_value(value).map_err(|e| LlmError::Upstream {
            status,
            message: format!("response failed canonical validation: {e}"),
        })
    }

    /// Parse an SSE-framed provider response, keeping the terminal event
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::parse_json_response`].
    pub fn parse_sse_response(&self, status: u16, body: &str) -> Result<ResponsesResult, LlmError> {
        if status >= 400 {
            return Err(LlmError::from_upstream_status(status, transform::extract_error_message(body)));
        }

        let mut value = transform::collapse_sse_body(status, body)?;
        transform::normalize_response_value(&mut value);

        serde_json::from_value(value).map_err(|e| LlmError::Upstream {
            status,
            message: format!("response failed canonical validation: {e}"),
        })
    }

    /// Sanitize and tag-dispatch one raw stream chunk
    ///
    /// # Errors
    ///
    /// Practically infallible: unknown shapes land in the catch-all
    /// variant instead of failing the stream.
    pub fn chunk_to_event(&self, mut chunk: Value) -> Result<ResponseStreamEvent, LlmError> {
        transform::sanitize_chunk(&mut chunk);

        match serde_json::from_value::<ResponseStreamEvent>(chunk.clone()) {
            Ok(event) => Ok(event),
            Err(e) => {
                tracing::debug!(provider = self.kind.slug(), error = %e, "forwarding unrecognized chunk verbatim");
                Ok(ResponseStreamEvent::Unknown(chunk))
            }
        }
    }
}

/// Append `suffix` to the URL path unless a responses path is already
/// present, leaving any query string untouched
fn append_suffix_once(url: &mut Url, suffix: &str) {
    let path = url.path().trim_end_matches('/').to_owned();

    if path.ends_with("/responses") {
        return;
    }

    url.set_path(&format!("{path}{suffix}"));
}

/// Convert config-level header rules into core rules, skipping invalid
/// entries with a warning
fn parse_header_rules(configs: &[prism_config::HeaderRuleConfig]) -> Vec<HeaderRule> {
    use prism_config::HeaderRuleConfig;
    use prism_core::{HeaderForward, HeaderInsert, HeaderRemove};

    configs
        .iter()
        .filter_map(|config| match config {
            HeaderRuleConfig::Forward(fwd) => {
                let name = parse_name_or_pattern(&fwd.name)?;
                let rename = fwd.rename.as_deref().and_then(|r| HeaderName::try_from(r).ok());
                let default = fwd.default.as_deref().and_then(|d| HeaderValue::try_from(d).ok());
                Some(HeaderRule::Forward(HeaderForward { name, rename, default }))
            }
            HeaderRuleConfig::Insert(ins) => {
                let name = HeaderName::try_from(ins.name.as_str()).ok()?;
                let value = HeaderValue::try_from(ins.value.as_str()).ok()?;
                Some(HeaderRule::Insert(HeaderInsert { name, value }))
            }
            HeaderRuleConfig::Remove(rem) => {
                let name = parse_name_or_pattern(&rem.name)?;
                Some(HeaderRule::Remove(HeaderRemove { name }))
            }
        })
        .collect()
}

fn parse_name_or_pattern(s: &str) -> Option<prism_core::NameOrPattern> {
    use prism_core::{HeaderPattern, NameOrPattern};

    if s.contains('*') || s.contains('?') || s.contains('[') || s.contains('(') {
        let regex = compile_pattern(s)?;
        Some(NameOrPattern::Pattern(HeaderPattern(regex)))
    } else {
        HeaderName::try_from(s).ok().map(NameOrPattern::Name)
    }
}

fn compile_pattern(s: &str) -> Option<regex::Regex> {
    match regex::Regex::new(s) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(pattern = s, error = %e, "skipping invalid header pattern");
            None
        }
    }
}
