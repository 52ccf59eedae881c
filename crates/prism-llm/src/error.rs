use http::StatusCode;
use prism_core::HttpError;
use prism_oauth::OauthError;
use thiserror::Error;

/// Errors that can occur while transforming or dispatching a request
#[derive(Debug, Error)]
pub enum LlmError {
    /// Credentials are missing, invalid, or could not be acquired
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Caller requested a parameter the target provider cannot accept
    #[error("{provider} does not support parameter '{param}' for model {model}; set drop_params to discard it")]
    UnsupportedParam {
        /// Offending parameter name
        param: String,
        /// Model the request targeted
        model: String,
        /// Provider slug
        provider: String,
    },

    /// Caller requested a parameter value outside what the provider accepts
    #[error("{provider} rejects {param}={value} for model {model}; set drop_params to discard it")]
    UnsupportedParamValue {
        /// Offending parameter name
        param: String,
        /// Offending value, rendered as JSON
        value: String,
        /// Model the request targeted
        model: String,
        /// Provider slug
        provider: String,
    },

    /// Request is malformed independent of any provider
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No configuration exists for the requested provider
    #[error("provider not found: {provider}")]
    ProviderNotFound {
        /// Provider slug parsed from the model string
        provider: String,
    },

    /// Provider asked us to back off
    #[error("rate limited by provider: {message}")]
    RateLimited {
        /// Upstream message
        message: String,
    },

    /// Provider returned an error or an unparseable body
    #[error("upstream error ({status}): {message}")]
    Upstream {
        /// Upstream HTTP status
        status: u16,
        /// Upstream message
        message: String,
    },

    /// Error while decoding a streaming response
    #[error("streaming error: {0}")]
    Streaming(String),

    /// Unexpected internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl LlmError {
    /// Classify an upstream HTTP failure into the canonical taxonomy
    #[must_use]
    pub fn from_upstream_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => Self::Authentication(message),
            429 => Self::RateLimited { message },
            _ => Self::Upstream { status, message },
        }
    }
}

impl From<OauthError> for LlmError {
    fn from(e: OauthError) -> Self {
        Self::Authentication(e.to_string())
    }
}

impl HttpError for LlmError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::UnsupportedParam { .. } | Self::UnsupportedParamValue { .. } | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ProviderNotFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            // Propagate the provider's own status where it is a meaningful
            // HTTP code; anything else reads as a bad gateway
            Self::Upstream { status, .. } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            Self::Streaming(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::Authentication(_) => "authentication_error",
            Self::UnsupportedParam { .. } | Self::UnsupportedParamValue { .. } | Self::InvalidRequest(_) => {
                "invalid_request_error"
            }
            Self::ProviderNotFound { .. } => "not_found_error",
            Self::RateLimited { .. } => "rate_limit_error",
            Self::Upstream { .. } => "upstream_error",
            Self::Streaming(_) => "streaming_error",
            Self::Internal(_) => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(matches!(
            LlmError::from_upstream_status(401, String::new()),
            LlmError::Authentication(_)
        ));
        assert!(matches!(
            LlmError::from_upstream_status(429, String::new()),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            LlmError::from_upstream_status(503, String::new()),
            LlmError::Upstream { status: 503, .. }
        ));
    }

    #[test]
    fn upstream_status_is_preserved_in_http_mapping() {
        let err = LlmError::Upstream {
            status: 503,
            message: "overloaded".to_owned(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn unsupported_param_message_names_the_escape_hatch() {
        let err = LlmError::UnsupportedParam {
            param: "instructions".to_owned(),
            model: "sonar-pro".to_owned(),
            provider: "perplexity".to_owned(),
        };
        let message = err.to_string();
        assert!(message.contains("instructions"));
        assert!(message.contains("drop_params"));
    }
}
