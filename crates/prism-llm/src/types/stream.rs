use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::response::ResponsesResult;

/// Canonical streaming event, tagged by `type`
///
/// Raw provider chunks pass through [`crate::transform::sanitize_chunk`]
/// before deserialization, so positional fields here are non-optional:
/// a chunk that omits them arrives with safe defaults already filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseStreamEvent {
    /// Response object created
    #[serde(rename = "response.created")]
    Created {
        /// Initial response snapshot
        response: ResponsesResult,
    },
    /// Generation has started
    #[serde(rename = "response.in_progress")]
    InProgress {
        /// Current response snapshot
        response: ResponsesResult,
    },
    /// A new output item appeared
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {
        /// Position of the item in `output`
        output_index: u32,
        /// The item as first seen
        item: Value,
    },
    /// An output item reached its final form
    #[serde(rename = "response.output_item.done")]
    OutputItemDone {
        /// Position of the item in `output`
        output_index: u32,
        /// The finished item
        item: Value,
    },
    /// Incremental text
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        /// Item the delta belongs to
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item_id: Option<String>,
        /// Position of the item in `output`
        output_index: u32,
        /// Position of the content part within the item
        content_index: u32,
        /// Text fragment
        delta: String,
    },
    /// Terminal success, carrying the full response
    #[serde(rename = "response.completed")]
    Completed {
        /// Final response including usage
        response: ResponsesResult,
    },
    /// Terminal failure, carrying the full response
    #[serde(rename = "response.failed")]
    Failed {
        /// Final response including the error payload
        response: ResponsesResult,
    },
    /// Stream-level error
    #[serde(rename = "error")]
    Error {
        /// Machine-readable code
        code: String,
        /// Human-readable message
        message: String,
        /// Offending parameter, when the provider names one
        #[serde(default, skip_serializing_if = "Option::is_none")]
        param: Option<String>,
    },
    /// Unrecognized event, forwarded untouched
    #[serde(untagged)]
    Unknown(Value),
}

impl ResponseStreamEvent {
    /// Whether this event ends the stream
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. } | Self::Error { .. })
    }

    /// The `type` tag of this event as it appears on the wire
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::Created { .. } => "response.created",
            Self::InProgress { .. } => "response.in_progress",
            Self::OutputItemAdded { .. } => "response.output_item.added",
            Self::OutputItemDone { .. } => "response.output_item.done",
            Self::OutputTextDelta { .. } => "response.output_text.delta",
            Self::Completed { .. } => "response.completed",
            Self::Failed { .. } => "response.failed",
            Self::Error { .. } => "error",
            Self::Unknown(value) => value.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_event_round_trips() {
        let raw = serde_json::json!({
            "type": "response.output_text.delta",
            "output_index": 0,
            "content_index": 0,
            "delta": "Hel"
        });

        let event: ResponseStreamEvent = serde_json::from_value(raw).unwrap();
        assert!(matches!(&event, ResponseStreamEvent::OutputTextDelta { delta, .. } if delta == "Hel"));
        assert_eq!(event.event_type(), "response.output_text.delta");
    }

    #[test]
    fn unrecognized_type_is_preserved() {
        let raw = serde_json::json!({
            "type": "response.audio.delta",
            "delta": "...",
        });

        let event: ResponseStreamEvent = serde_json::from_value(raw.clone()).unwrap();
        assert!(matches!(event, ResponseStreamEvent::Unknown(_)));
        assert_eq!(event.event_type(), "response.audio.delta");
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }
}
