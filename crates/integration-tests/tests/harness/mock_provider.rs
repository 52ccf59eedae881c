//! Mock upstream provider for integration tests
//!
//! Implements a minimal Responses-shaped API that returns canned
//! payloads and records what it was sent

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Mock provider that returns predictable responses
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockState>,
}

struct MockState {
    request_count: AtomicU32,
    /// Requests to fail with 500 before succeeding (0 = never fail)
    fail_count: AtomicU32,
    /// Fixed status to answer with, overriding everything else
    fixed_status: Option<u16>,
    /// Answer with an SSE-framed body instead of plain JSON
    sse: bool,
    /// Last request body received
    last_body: Mutex<Option<Value>>,
    /// Last request headers received
    last_headers: Mutex<Option<HeaderMap>>,
}

impl MockProvider {
    /// Start a mock returning plain JSON responses
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, None, false).await
    }

    /// Start a mock that fails the first `n` requests with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, None, false).await
    }

    /// Start a mock that always answers with `status`
    pub async fn start_with_status(status: u16) -> anyhow::Result<Self> {
        Self::start_inner(0, Some(status), false).await
    }

    /// Start a mock that frames every answer as an event stream
    pub async fn start_sse() -> anyhow::Result<Self> {
        Self::start_inner(0, None, true).await
    }

    async fn start_inner(fail_count: u32, fixed_status: Option<u16>, sse: bool) -> anyhow::Result<Self> {
        let state = Arc::new(MockState {
            request_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            fixed_status,
            sse,
            last_body: Mutex::new(None),
            last_headers: Mutex::new(None),
        });

        let app = Router::new()
            .route("/v1/responses", routing::post(handle_responses))
            .route("/responses", routing::post(handle_responses))
            .route("/openai/responses", routing::post(handle_responses))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Base URL for configuring the mock as a provider endpoint
    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    /// Base URL without a path, for providers that append their own
    pub fn bare_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of requests received
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Body of the most recent request
    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    /// Headers of the most recent request
    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.state.last_headers.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_responses(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    *state.last_body.lock().unwrap() = Some(body.clone());
    *state.last_headers.lock().unwrap() = Some(headers);

    if let Some(status) = state.fixed_status {
        let error = serde_json::json!({
            "error": { "message": "mock provider rejection", "type": "mock_error" }
        });
        return (StatusCode::from_u16(status).unwrap(), Json(error)).into_response();
    }

    if state.fail_count.load(Ordering::Relaxed) > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return (StatusCode::INTERNAL_SERVER_ERROR, "mock failure").into_response();
    }

    let model = body.get("model").and_then(Value::as_str).unwrap_or("mock-model").to_owned();
    let wants_stream = body.get("stream").and_then(Value::as_bool).unwrap_or(false);

    if state.sse || wants_stream {
        return sse_reply(&model);
    }

    Json(completed_response(&model)).into_response()
}

/// Canned terminal response, with a camelCase timestamp the gateway is
/// expected to normalize
fn completed_response(model: &str) -> Value {
    serde_json::json!({
        "id": "resp_mock_1",
        "object": "response",
        "createdAt": 1_741_476_542.0,
        "status": "completed",
        "model": model,
        "output": [{
            "type": "message",
            "id": "msg_mock_1",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": "mock says hi" }]
        }],
        "usage": { "input_tokens": 4, "output_tokens": 3, "total_tokens": 7 }
    })
}

fn sse_reply(model: &str) -> axum::response::Response {
    // One delta chunk deliberately omits its positional fields to
    // exercise the gateway's chunk sanitizer
    let body = format!(
        concat!(
            "data: {{\"type\":\"response.created\",\"response\":{{\"id\":\"resp_mock_1\",\"createdAt\":1741476542,\"status\":\"in_progress\"}}}}\n\n",
            "data: {{\"type\":\"response.output_text.delta\",\"delta\":\"mock \"}}\n\n",
            "data: {{\"type\":\"response.output_text.delta\",\"output_index\":0,\"content_index\":0,\"delta\":\"says hi\"}}\n\n",
            "data: {}\n\n",
            "data: [DONE]\n\n",
        ),
        serde_json::json!({ "type": "response.completed", "response": completed_response(model) })
    );

    (
        StatusCode::OK,
        [(http::header::CONTENT_TYPE, "text/event-stream")],
        body,
    )
        .into_response()
}
