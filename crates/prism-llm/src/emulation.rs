//! Streaming emulation for providers without native token streaming
//!
//! When a caller asks to stream but the target provider/model cannot,
//! the dispatcher performs a normal blocking call and synthesizes a
//! bounded canonical event sequence from the single final response:
//! `created`, `in_progress`, one text delta per message item, then the
//! terminal event. Events arrive in that order, never reordered.

use serde_json::Value;

use crate::types::{OutputItem, ResponseStatus, ResponseStreamEvent, ResponsesResult};

/// Synthesize a canonical event sequence from one terminal response
#[must_use]
pub fn fake_stream_events(result: &ResponsesResult) -> Vec<ResponseStreamEvent> {
    let mut events = Vec::new();

    events.push(ResponseStreamEvent::Created {
        response: progress_snapshot(result),
    });
    events.push(ResponseStreamEvent::InProgress {
        response: progress_snapshot(result),
    });

    for (index, item) in result.output.iter().enumerate() {
        if let Some(text) = message_text(item) {
            events.push(ResponseStreamEvent::OutputTextDelta {
                item_id: item_id(item),
                output_index: u32::try_from(index).unwrap_or(0),
                content_index: 0,
                delta: text,
            });
        }
    }

    events.push(match result.status {
        ResponseStatus::Failed => ResponseStreamEvent::Failed {
            response: result.clone(),
        },
        _ => ResponseStreamEvent::Completed {
            response: result.clone(),
        },
    });

    events
}

/// Snapshot of the response as it would have looked mid-generation:
/// in progress, no output, no usage
fn progress_snapshot(result: &ResponsesResult) -> ResponsesResult {
    let mut snapshot = result.clone();
    snapshot.status = ResponseStatus::InProgress;
    snapshot.output = Vec::new();
    // Usage only belongs on terminal events when a stream is built up
    // incrementally
    snapshot.usage = None;
    snapshot.error = None;
    snapshot
}

/// Concatenated text of a message item's `output_text` parts
fn message_text(item: &OutputItem) -> Option<String> {
    let OutputItem::Message { content, .. } = item else {
        return None;
    };

    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

fn item_id(item: &OutputItem) -> Option<String> {
    match item {
        OutputItem::Message { id, .. } => id.clone(),
        _ => None,
    }
}
