//! Per-call pipeline: resolve, transform, send
//!
//! Pure glue between a selected [`ProviderConfig`] and the HTTP client;
//! provider selection and stream assembly live in [`crate::state`].

use http::HeaderMap;
use prism_core::{CallOverrides, RequestContext};
use serde_json::Value;
use url::Url;

use crate::error::LlmError;
use crate::provider::ProviderConfig;
use crate::types::{OptionalParams, ResponseInput};

/// Fully resolved outbound call, ready to send
pub(crate) struct PreparedCall {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Run the transformation pipeline for one request
///
/// Order matters: parameters are mapped (and possibly rejected) before
/// any credential resolution happens, so a capability error never costs
/// an OAuth round trip.
pub(crate) async fn prepare(
    config: &dyn ProviderConfig,
    model: &str,
    input: &ResponseInput,
    params: OptionalParams,
    context: &RequestContext,
    overrides: &CallOverrides,
    drop_params: bool,
) -> Result<PreparedCall, LlmError> {
    let mapped = config.map_params(params, model, drop_params)?;

    let url = config.complete_url(overrides)?;
    let headers = config
        .validate_environment(HeaderMap::new(), model, overrides, context)
        .await?;
    let body = config.transform_request(model, input, mapped, overrides)?;

    tracing::debug!(
        provider = config.kind().slug(),
        model,
        url = %url,
        "prepared outbound call"
    );

    Ok(PreparedCall { url, headers, body })
}

/// Send a prepared call and collect the full response body
///
/// Transport failures surface as upstream errors with status 0; HTTP
/// error statuses are left for `transform_response` to classify, since
/// the body often carries the provider's real message.
pub(crate) async fn send_blocking(
    http: &reqwest::Client,
    call: &PreparedCall,
    overrides: &CallOverrides,
) -> Result<(u16, String), LlmError> {
    let response = send(http, call, overrides).await?;
    let status = response.status().as_u16();
    let body = response.text().await.map_err(|e| LlmError::Upstream {
        status,
        message: format!("failed to read response body: {e}"),
    })?;

    Ok((status, body))
}

/// Send a prepared call, returning the live response for streaming
pub(crate) async fn send_streaming(
    http: &reqwest::Client,
    call: &PreparedCall,
    overrides: &CallOverrides,
) -> Result<reqwest::Response, LlmError> {
    let response = send(http, call, overrides).await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::from_upstream_status(
            status.as_u16(),
            crate::transform::extract_error_message(&body),
        ));
    }

    Ok(response)
}

async fn send(
    http: &reqwest::Client,
    call: &PreparedCall,
    overrides: &CallOverrides,
) -> Result<reqwest::Response, LlmError> {
    let mut builder = http.post(call.url.clone()).headers(call.headers.clone()).json(&call.body);

    if let Some(timeout) = overrides.timeout {
        builder = builder.timeout(timeout);
    }

    builder.send().await.map_err(|e| {
        tracing::error!(url = %call.url, error = %e, "outbound request failed");
        LlmError::Upstream {
            status: 0,
            message: e.to_string(),
        }
    })
}
