use serde_json::Value;

use crate::error::LlmError;

/// Sentinel line some providers use to close an event stream
const DONE_SENTINEL: &str = "[DONE]";

/// Collapse an SSE-framed body into the single terminal response
///
/// Some providers answer every call with an event stream, including calls
/// the caller made without streaming. This scans `data:`-prefixed lines,
/// skips blanks and comments, stops at the terminator sentinel, and keeps
/// only the terminal completed/failed event's response object, discarding
/// intermediate chunks.
///
/// # Errors
///
/// Returns [`LlmError::Upstream`] when the body contains no terminal
/// event.
pub fn collapse_sse_body(status: u16, body: &str) -> Result<Value, LlmError> {
    let mut terminal: Option<Value> = None;

    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(':') {
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        if data == DONE_SENTINEL {
            break;
        }

        let Ok(chunk) = serde_json::from_str::<Value>(data) else {
            tracing::debug!(data, "skipping unparseable SSE line");
            continue;
        };

        match chunk.get("type").and_then(Value::as_str) {
            Some("response.completed" | "response.failed") => {
                terminal = chunk.get("response").cloned();
            }
            _ => {}
        }
    }

    terminal.ok_or_else(|| LlmError::Upstream {
        status,
        message: "event stream ended without a terminal response".to_owned(),
    })
}
