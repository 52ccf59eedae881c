//! Entra ID identity chain for Azure-style deployments
//!
//! Each tier is attempted in order and falls through silently on failure;
//! only the final environment-variable fallback (handled by the provider
//! config itself) can leave the request without credentials.

use prism_core::AzureCredentials;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Default scope requested from the Entra ID token endpoint
const DEFAULT_SCOPE: &str = "https://cognitiveservices.azure.com/.default";

/// Azure IMDS endpoint for managed-identity token acquisition
const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";

#[derive(Debug, Deserialize)]
struct EntraTokenResponse {
    access_token: String,
}

/// Resolve a bearer token from the Entra ID chain, if any tier succeeds
///
/// Tiers, in order: pre-acquired AD token, client-credential grant,
/// username/password grant, OIDC token exchange, managed identity via
/// IMDS. Failures are logged at debug and skipped.
pub async fn resolve_entra_token(http: &Client, creds: &AzureCredentials) -> Option<SecretString> {
    if let Some(token) = &creds.ad_token {
        return Some(token.clone());
    }

    if let Some(token) = client_credential_token(http, creds).await {
        return Some(token);
    }

    if let Some(token) = password_grant_token(http, creds).await {
        return Some(token);
    }

    if let Some(token) = oidc_exchange_token(http, creds).await {
        return Some(token);
    }

    managed_identity_token(http, creds).await
}

fn token_url(tenant_id: &str) -> String {
    format!("https://login.microsoftonline.com/{tenant_id}/oauth2/v2.0/token")
}

fn scope(creds: &AzureCredentials) -> &str {
    creds.scope.as_deref().unwrap_or(DEFAULT_SCOPE)
}

async fn fetch_token(http: &Client, url: &str, form: &[(&str, &str)], tier: &str) -> Option<SecretString> {
    let response = match http.post(url).form(form).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(tier, error = %e, "entra tier transport failure");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(tier, status = %response.status(), "entra tier rejected");
        return None;
    }

    match response.json::<EntraTokenResponse>().await {
        Ok(body) => Some(SecretString::from(body.access_token)),
        Err(e) => {
            tracing::debug!(tier, error = %e, "entra tier returned malformed body");
            None
        }
    }
}

async fn client_credential_token(http: &Client, creds: &AzureCredentials) -> Option<SecretString> {
    let tenant = creds.tenant_id.as_deref()?;
    let client_id = creds.client_id.as_deref()?;
    let secret = creds.client_secret.as_ref()?;

    fetch_token(
        http,
        &token_url(tenant),
        &[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", secret.expose_secret()),
            ("scope", scope(creds)),
        ],
        "client_credentials",
    )
    .await
}

async fn password_grant_token(http: &Client, creds: &AzureCredentials) -> Option<SecretString> {
    let tenant = creds.tenant_id.as_deref()?;
    let client_id = creds.client_id.as_deref()?;
    let username = creds.username.as_deref()?;
    let password = creds.password.as_ref()?;

    fetch_token(
        http,
        &token_url(tenant),
        &[
            ("grant_type", "password"),
            ("client_id", client_id),
            ("username", username),
            ("password", password.expose_secret()),
            ("scope", scope(creds)),
        ],
        "password",
    )
    .await
}

async fn oidc_exchange_token(http: &Client, creds: &AzureCredentials) -> Option<SecretString> {
    let tenant = creds.tenant_id.as_deref()?;
    let client_id = creds.client_id.as_deref()?;
    let oidc_token = creds.oidc_token.as_ref()?;

    fetch_token(
        http,
        &token_url(tenant),
        &[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            (
                "client_assertion_type",
                "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
            ),
            ("client_assertion", oidc_token.expose_secret()),
            ("scope", scope(creds)),
        ],
        "oidc_exchange",
    )
    .await
}

async fn managed_identity_token(http: &Client, creds: &AzureCredentials) -> Option<SecretString> {
    // Managed identity only makes sense with a client id to disambiguate
    // user-assigned identities; system-assigned works without one, so a
    // bare attempt is still made when nothing else is configured
    let mut request = http
        .get(IMDS_TOKEN_URL)
        .header("Metadata", "true")
        .query(&[("api-version", "2018-02-01"), ("resource", "https://cognitiveservices.azure.com/")]);

    if let Some(client_id) = creds.client_id.as_deref() {
        request = request.query(&[("client_id", client_id)]);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(tier = "managed_identity", error = %e, "entra tier transport failure");
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!(tier = "managed_identity", status = %response.status(), "entra tier rejected");
        return None;
    }

    match response.json::<EntraTokenResponse>().await {
        Ok(body) => Some(SecretString::from(body.access_token)),
        Err(e) => {
            tracing::debug!(tier = "managed_identity", error = %e, "entra tier returned malformed body");
            None
        }
    }
}
