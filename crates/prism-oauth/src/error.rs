use thiserror::Error;

/// Errors from token acquisition and persistence
#[derive(Debug, Error)]
pub enum OauthError {
    /// Device authorization endpoint rejected the request
    #[error("device code request failed ({status}): {message}")]
    GetDeviceCode {
        /// Upstream HTTP status (0 when the request never completed)
        status: u16,
        /// Upstream message
        message: String,
    },

    /// Polling or exchanging for an access token failed
    #[error("access token request failed ({status}): {message}")]
    GetAccessToken {
        /// Upstream HTTP status (0 when the request never completed)
        status: u16,
        /// Upstream message
        message: String,
    },

    /// Refresh grant failed
    #[error("token refresh failed ({status}): {message}")]
    RefreshAccessToken {
        /// Upstream HTTP status (0 when the request never completed)
        status: u16,
        /// Upstream message
        message: String,
    },

    /// Human never approved the device login within the deadline
    #[error("device login timed out after {0} seconds")]
    LoginTimeout(u64),

    /// Reading or writing the persisted token record failed
    #[error("token store error: {0}")]
    Store(String),
}
