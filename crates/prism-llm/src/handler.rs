//! Axum route handlers for the canonical Responses endpoints

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use futures_util::{Stream, StreamExt};
use http::header::AUTHORIZATION;
use prism_core::{CallOverrides, HttpError, RequestContext};
use secrecy::SecretString;

use crate::error::LlmError;
use crate::state::GatewayState;
use crate::types::{ResponseStreamEvent, ResponsesRequest};

/// Build the gateway router with all endpoints
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/v1/responses", routing::post(create_response))
        .route("/v1/models", routing::get(list_models))
        .with_state(state)
}

/// Handle `POST /v1/responses`
async fn create_response(
    State(state): State<GatewayState>,
    headers: http::HeaderMap,
    Json(request): Json<ResponsesRequest>,
) -> Response {
    let context = context_from_headers(&headers);
    let overrides = CallOverrides::default();

    if request.stream {
        match state.complete_stream(request, &context, &overrides).await {
            Ok(stream) => sse_response(stream).into_response(),
            Err(e) => error_response(&e),
        }
    } else {
        match state.complete(request, &context, &overrides).await {
            Ok(result) => Json(result).into_response(),
            Err(e) => error_response(&e),
        }
    }
}

/// Handle `GET /v1/models`
async fn list_models(State(state): State<GatewayState>) -> Response {
    let data: Vec<_> = state
        .deployments()
        .iter()
        .map(|name| {
            serde_json::json!({
                "id": name,
                "object": "model",
                "owned_by": "prism"
            })
        })
        .collect();

    Json(serde_json::json!({ "object": "list", "data": data })).into_response()
}

/// Pull the caller's bearer token out of the inbound headers
fn context_from_headers(headers: &http::HeaderMap) -> RequestContext {
    let api_key = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| SecretString::from(token.to_owned()));

    RequestContext::new(headers.clone(), api_key)
}

/// Render the event stream as typed SSE frames
fn sse_response(
    stream: std::pin::Pin<Box<dyn Stream<Item = Result<ResponseStreamEvent, LlmError>> + Send>>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let frames = stream.map(|result| match result {
        Ok(event) => {
            let event_type = event.event_type().to_owned();
            let data = serde_json::to_string(&event).unwrap_or_default();
            Ok(Event::default().event(event_type).data(data))
        }
        Err(e) => {
            let body = serde_json::json!({
                "type": "error",
                "code": e.error_type(),
                "message": e.client_message(),
            });
            Ok(Event::default().event("error").data(body.to_string()))
        }
    });

    Sse::new(frames).keep_alive(KeepAlive::default())
}

/// Convert a gateway error into the canonical JSON error body
fn error_response(error: &LlmError) -> Response {
    let status = error.status_code();
    let body = serde_json::json!({
        "error": {
            "message": error.client_message(),
            "type": error.error_type(),
            "code": serde_json::Value::Null,
        }
    });

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_is_extracted_from_headers() {
        let mut headers = http::HeaderMap::new();
        headers.insert(AUTHORIZATION, http::HeaderValue::from_static("Bearer sk-caller"));

        let context = context_from_headers(&headers);
        assert!(context.api_key.is_some());
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let mut headers = http::HeaderMap::new();
        headers.insert(AUTHORIZATION, http::HeaderValue::from_static("Basic dXNlcg=="));

        let context = context_from_headers(&headers);
        assert!(context.api_key.is_none());
    }
}
