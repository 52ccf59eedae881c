use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::jwt;

/// Safety margin subtracted from `expires_at` so a token is retired
/// before it can expire under an in-flight request
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Window after a device-code request during which concurrent callers
/// wait on the persisted record instead of starting a second flow
pub const DEVICE_CODE_COOLDOWN_SECS: i64 = 300;

/// Current time as epoch seconds
#[must_use]
pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Persisted OAuth state for one provider
///
/// Written as a whole file on every update; stale records are harmless
/// and simply trigger a fresh login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthRecord {
    /// Bearer token presented to the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Token used for the refresh grant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// ID token carrying identity claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Epoch seconds at which `access_token` expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Account id decoded from token claims
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Epoch seconds of the last device-code request (cooldown marker)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_code_requested_at: Option<i64>,
}

impl AuthRecord {
    /// Expiry timestamp, deriving it from the JWT `exp` claim when the
    /// record has a token but no stored value
    ///
    /// Callers should persist the record after this returns a derived
    /// value so the decode is not repeated on every request.
    pub fn ensure_expires_at(&mut self) -> Option<i64> {
        if self.expires_at.is_none()
            && let Some(token) = &self.access_token
        {
            self.expires_at = jwt::expiry_claim(token);
        }
        self.expires_at
    }

    /// Whether the access token is still usable at `now`, with skew applied
    #[must_use]
    pub fn has_valid_access_token(&mut self, now: i64) -> bool {
        if self.access_token.is_none() {
            return false;
        }

        match self.ensure_expires_at() {
            Some(expires_at) => now < expires_at - EXPIRY_SKEW_SECS,
            // No expiry anywhere: treat as expired and force a refresh
            None => false,
        }
    }

    /// Whether a device-code flow was started recently enough that
    /// callers should wait for it instead of launching their own
    #[must_use]
    pub fn in_device_code_cooldown(&self, now: i64) -> bool {
        self.device_code_requested_at
            .is_some_and(|at| now - at < DEVICE_CODE_COOLDOWN_SECS)
    }
}
