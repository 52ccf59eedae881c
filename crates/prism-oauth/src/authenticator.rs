use std::time::Duration;

use reqwest::Client;

use crate::device::{self, DeviceFlowSpec, TokenResponse};
use crate::error::OauthError;
use crate::jwt;
use crate::record::{AuthRecord, DEVICE_CODE_COOLDOWN_SECS, now_epoch};
use crate::store::TokenStore;

/// Seconds between checks of the persisted record while another caller's
/// device flow is in its cooldown window
const COOLDOWN_POLL_SECS: u64 = 5;

/// A usable bearer credential plus the account it belongs to
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// Bearer token value
    pub token: String,
    /// Account id decoded from token claims, when present
    pub account_id: Option<String>,
}

/// Token lifecycle manager for one device-code provider
///
/// Stateless across requests apart from the persisted record: every call
/// to [`Authenticator::access_token`] re-reads the store, so multiple
/// instances over the same directory converge on the same credentials.
pub struct Authenticator {
    spec: DeviceFlowSpec,
    store: TokenStore,
    http: Client,
}

impl Authenticator {
    /// Build an authenticator over `store` for the given flow
    #[must_use]
    pub fn new(spec: DeviceFlowSpec, store: TokenStore) -> Self {
        Self {
            spec,
            store,
            http: Client::new(),
        }
    }

    /// Provider slug this authenticator serves
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        self.spec.slug
    }

    /// Produce a valid access token, acquiring or refreshing as needed
    ///
    /// Order of attempts: persisted non-expired token, refresh grant,
    /// waiting out another caller's cooldown window, full device login.
    ///
    /// # Errors
    ///
    /// Returns an [`OauthError`] when every acquisition path fails.
    pub async fn access_token(&self) -> Result<AccessToken, OauthError> {
        let mut record = self.store.load(self.spec.slug).await.unwrap_or_default();
        let now = now_epoch();
        let had_expiry = record.expires_at.is_some();

        if record.has_valid_access_token(now) {
            if !had_expiry {
                // The expiry was just derived from the JWT; persist it
                // so the decode is not repeated on every request
                self.store.save(self.spec.slug, &record).await?;
            }
            return Ok(self.to_access_token(&record));
        }

        if let Some(refresh_token) = record.refresh_token.clone() {
            match device::refresh_access_token(&self.http, &self.spec, &refresh_token).await {
                Ok(tokens) => {
                    let record = self.persist_tokens(tokens, record.device_code_requested_at).await?;
                    return Ok(self.to_access_token(&record));
                }
                Err(e) => {
                    tracing::warn!(provider = self.spec.slug, error = %e, "token refresh failed, falling back to device login");
                }
            }
        }

        if record.in_device_code_cooldown(now)
            && let Some(token) = self.wait_for_concurrent_login().await
        {
            return Ok(token);
        }

        self.device_login().await
    }

    /// Run the full device-code flow and persist the outcome
    async fn device_login(&self) -> Result<AccessToken, OauthError> {
        // Record the cooldown marker before anything slow happens so
        // concurrent callers see it immediately
        let mut record = self.store.load(self.spec.slug).await.unwrap_or_default();
        record.device_code_requested_at = Some(now_epoch());
        self.store.save(self.spec.slug, &record).await?;

        let authorization = device::request_device_authorization(&self.http, &self.spec).await?;

        let verification = authorization.verification_url.as_deref().unwrap_or("(see provider docs)");
        tracing::info!(
            provider = self.spec.slug,
            verification_url = verification,
            user_code = %authorization.user_code,
            "device login required"
        );
        println!("To authorize {}, visit {verification} and enter code: {}", self.spec.slug, authorization.user_code);

        let approved =
            device::poll_device_approval(&self.http, &self.spec, &authorization.device_auth_id, authorization.interval)
                .await?;

        let tokens = device::exchange_authorization_code(&self.http, &self.spec, &approved).await?;
        let record = self.persist_tokens(tokens, None).await?;

        Ok(self.to_access_token(&record))
    }

    /// While another caller's device flow is pending, watch the persisted
    /// record for a fresh token instead of racing a second login
    async fn wait_for_concurrent_login(&self) -> Option<AccessToken> {
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(u64::try_from(DEVICE_CODE_COOLDOWN_SECS).unwrap_or(300));

        while tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_secs(COOLDOWN_POLL_SECS)).await;

            let mut record = self.store.load(self.spec.slug).await.unwrap_or_default();
            if record.has_valid_access_token(now_epoch()) {
                return Some(self.to_access_token(&record));
            }
            if !record.in_device_code_cooldown(now_epoch()) {
                break;
            }
        }

        None
    }

    /// Build and persist a record from a token response
    async fn persist_tokens(
        &self,
        tokens: TokenResponse,
        device_code_requested_at: Option<i64>,
    ) -> Result<AuthRecord, OauthError> {
        let expires_at = tokens
            .expires_in
            .map(|secs| now_epoch() + secs)
            .or_else(|| jwt::expiry_claim(&tokens.access_token));

        let account_id = [tokens.id_token.as_deref(), Some(tokens.access_token.as_str())]
            .into_iter()
            .flatten()
            .find_map(|token| {
                jwt::decode_claims(token).and_then(|claims| jwt::string_claim(&claims, self.spec.account_id_claim))
            });

        let record = AuthRecord {
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
            id_token: tokens.id_token,
            expires_at,
            account_id,
            device_code_requested_at,
        };

        self.store.save(self.spec.slug, &record).await?;
        Ok(record)
    }

    fn to_access_token(&self, record: &AuthRecord) -> AccessToken {
        AccessToken {
            token: record.access_token.clone().unwrap_or_default(),
            account_id: record.account_id.clone(),
        }
    }
}
