use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::error::OauthError;

/// Minimum seconds between polls of the approval endpoint, regardless of
/// what interval the provider suggests
const POLL_FLOOR_SECS: u64 = 5;

/// Hard ceiling on how long a device login may stay pending
pub(crate) const LOGIN_TIMEOUT_SECS: u64 = 15 * 60;

/// Endpoints and identity of one provider's device-code flow
#[derive(Debug, Clone)]
pub struct DeviceFlowSpec {
    /// Provider slug; also names the persisted record file
    pub slug: &'static str,
    /// OAuth client id
    pub client_id: &'static str,
    /// Device-authorization endpoint
    pub device_auth_url: &'static str,
    /// Endpoint polled until the human approves the login
    pub poll_url: &'static str,
    /// Token exchange/refresh endpoint
    pub token_url: &'static str,
    /// Requested scope
    pub scope: &'static str,
    /// Claim path holding the account id inside the ID/access token
    pub account_id_claim: &'static [&'static str],
}

/// Response from the device-authorization endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceAuthorization {
    /// Identifier polled against the approval endpoint
    pub device_auth_id: String,
    /// Code the human enters in their browser
    pub user_code: String,
    /// URL the human visits to approve the login
    #[serde(default)]
    pub verification_url: Option<String>,
    /// Provider-suggested poll interval in seconds
    #[serde(default)]
    pub interval: Option<u64>,
}

/// Approval payload returned once the human completes the login
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovedLogin {
    /// Authorization code for the token exchange
    pub authorization_code: String,
    /// PKCE verifier to present alongside the code
    #[serde(default)]
    pub code_verifier: Option<String>,
}

/// Token endpoint response for both the exchange and refresh grants
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token
    pub access_token: String,
    /// Refresh token, when the grant issues one
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// ID token carrying identity claims
    #[serde(default)]
    pub id_token: Option<String>,
    /// Lifetime in seconds, when stated explicitly
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Request a device authorization, starting the login flow
///
/// # Errors
///
/// Returns [`OauthError::GetDeviceCode`] on any transport or non-2xx
/// failure.
pub async fn request_device_authorization(
    http: &Client,
    spec: &DeviceFlowSpec,
) -> Result<DeviceAuthorization, OauthError> {
    let body = serde_json::json!({
        "client_id": spec.client_id,
        "scope": spec.scope,
    });

    let response = http
        .post(spec.device_auth_url)
        .json(&body)
        .send()
        .await
        .map_err(|e| OauthError::GetDeviceCode {
            status: 0,
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(OauthError::GetDeviceCode {
            status: status.as_u16(),
            message,
        });
    }

    response.json().await.map_err(|e| OauthError::GetDeviceCode {
        status: status.as_u16(),
        message: format!("malformed device authorization response: {e}"),
    })
}

/// Poll the approval endpoint until the human completes the login
///
/// 403 and 404 mean "not yet approved" and keep the loop going; any other
/// failure aborts. The provider's suggested interval is honored with a
/// floor of five seconds, and the whole wait is capped at fifteen minutes
/// independent of caller cancellation.
///
/// # Errors
///
/// Returns [`OauthError::LoginTimeout`] when the deadline passes, or
/// [`OauthError::GetAccessToken`] on a non-pending failure.
pub async fn poll_device_approval(
    http: &Client,
    spec: &DeviceFlowSpec,
    device_auth_id: &str,
    suggested_interval: Option<u64>,
) -> Result<ApprovedLogin, OauthError> {
    let interval = Duration::from_secs(suggested_interval.unwrap_or(POLL_FLOOR_SECS).max(POLL_FLOOR_SECS));
    let deadline = tokio::time::Instant::now() + Duration::from_secs(LOGIN_TIMEOUT_SECS);

    loop {
        if tokio::time::Instant::now() >= deadline {
            return Err(OauthError::LoginTimeout(LOGIN_TIMEOUT_SECS));
        }

        let body = serde_json::json!({
            "client_id": spec.client_id,
            "device_auth_id": device_auth_id,
        });

        let response = http
            .post(spec.poll_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| OauthError::GetAccessToken {
                status: 0,
                message: e.to_string(),
            })?;

        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(|e| OauthError::GetAccessToken {
                status: status.as_u16(),
                message: format!("malformed approval response: {e}"),
            });
        }

        // Pending approval is signaled by 403/404, anything else is fatal
        if status.as_u16() != 403 && status.as_u16() != 404 {
            let message = response.text().await.unwrap_or_default();
            return Err(OauthError::GetAccessToken {
                status: status.as_u16(),
                message,
            });
        }

        tokio::time::sleep(interval).await;
    }
}

/// Exchange an approved authorization code for tokens
///
/// # Errors
///
/// Returns [`OauthError::GetAccessToken`] on any failure.
pub async fn exchange_authorization_code(
    http: &Client,
    spec: &DeviceFlowSpec,
    login: &ApprovedLogin,
) -> Result<TokenResponse, OauthError> {
    let mut form = vec![
        ("grant_type", "authorization_code".to_owned()),
        ("client_id", spec.client_id.to_owned()),
        ("code", login.authorization_code.clone()),
    ];
    if let Some(verifier) = &login.code_verifier {
        form.push(("code_verifier", verifier.clone()));
    }

    post_token_form(http, spec.token_url, &form)
        .await
        .map_err(|(status, message)| OauthError::GetAccessToken { status, message })
}

/// Redeem a refresh token for a new access token
///
/// # Errors
///
/// Returns [`OauthError::RefreshAccessToken`] on any failure.
pub async fn refresh_access_token(
    http: &Client,
    spec: &DeviceFlowSpec,
    refresh_token: &str,
) -> Result<TokenResponse, OauthError> {
    let form = vec![
        ("grant_type", "refresh_token".to_owned()),
        ("client_id", spec.client_id.to_owned()),
        ("refresh_token", refresh_token.to_owned()),
    ];

    post_token_form(http, spec.token_url, &form)
        .await
        .map_err(|(status, message)| OauthError::RefreshAccessToken { status, message })
}

async fn post_token_form(
    http: &Client,
    url: &str,
    form: &[(&str, String)],
) -> Result<TokenResponse, (u16, String)> {
    let response = http
        .post(url)
        .form(form)
        .send()
        .await
        .map_err(|e| (0, e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err((status.as_u16(), message));
    }

    response
        .json()
        .await
        .map_err(|e| (status.as_u16(), format!("malformed token response: {e}")))
}
