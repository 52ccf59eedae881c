use std::time::Duration;

use secrecy::SecretString;

/// Runtime context for provider requests
///
/// Carries the pieces of the inbound HTTP request that provider
/// transformations are allowed to see.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Headers from the inbound request
    headers: http::HeaderMap,
    /// Caller-supplied API key that overrides the configured key
    pub api_key: Option<SecretString>,
}

impl RequestContext {
    /// Create a context with no headers and no caller key
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a context from inbound request headers
    #[must_use]
    pub fn new(headers: http::HeaderMap, api_key: Option<SecretString>) -> Self {
        Self { headers, api_key }
    }

    /// Access inbound request headers
    #[must_use]
    pub const fn headers(&self) -> &http::HeaderMap {
        &self.headers
    }
}

/// Per-call transport configuration
///
/// Everything that shapes the outbound call but is not part of the API
/// surface itself: credentials, endpoint overrides, timeouts. Resolved
/// per request, ahead of any configured or environment fallback.
#[derive(Debug, Clone, Default)]
pub struct CallOverrides {
    /// Explicit API key for this call
    pub api_key: Option<SecretString>,
    /// Explicit API base URL for this call
    pub api_base: Option<String>,
    /// API version query parameter (Azure-style endpoints)
    pub api_version: Option<String>,
    /// Outbound request timeout
    pub timeout: Option<Duration>,
    /// Azure identity chain inputs
    pub azure: AzureCredentials,
}

/// Inputs to the Azure identity chain, tried in declaration order
#[derive(Debug, Clone, Default)]
pub struct AzureCredentials {
    /// Pre-acquired Entra ID bearer token
    pub ad_token: Option<SecretString>,
    /// Tenant for client-credential and password grants
    pub tenant_id: Option<String>,
    /// Client (application) id
    pub client_id: Option<String>,
    /// Client secret for the client-credential grant
    pub client_secret: Option<SecretString>,
    /// Username for the resource-owner password grant
    pub username: Option<String>,
    /// Password for the resource-owner password grant
    pub password: Option<SecretString>,
    /// Externally issued OIDC token to exchange for an Entra ID token
    pub oidc_token: Option<SecretString>,
    /// Scope requested from the token endpoint
    pub scope: Option<String>,
}

impl AzureCredentials {
    /// Whether any chain input beyond the env-var fallback is present
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ad_token.is_none()
            && self.tenant_id.is_none()
            && self.client_id.is_none()
            && self.client_secret.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.oidc_token.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_has_no_key_or_headers() {
        let ctx = RequestContext::empty();
        assert!(ctx.api_key.is_none());
        assert!(ctx.headers().is_empty());
    }

    #[test]
    fn default_azure_credentials_are_empty() {
        assert!(AzureCredentials::default().is_empty());
    }
}
