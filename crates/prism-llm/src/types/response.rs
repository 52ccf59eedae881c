use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::item::OutputItem;

/// Lifecycle state of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Terminal success
    Completed,
    /// Terminated early (token limit, content filter)
    Incomplete,
    /// Still being generated
    InProgress,
    /// Terminal failure
    Failed,
    /// Asynchronous task is executing
    Running,
    /// Asynchronous task is queued
    Pending,
}

impl ResponseStatus {
    /// Whether this status ends the response lifecycle
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Incomplete | Self::Failed)
    }
}

/// Token accounting for a completed response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseUsage {
    /// Tokens consumed by the input
    #[serde(default)]
    pub input_tokens: u64,
    /// Tokens generated
    #[serde(default)]
    pub output_tokens: u64,
    /// Sum of input and output
    #[serde(default)]
    pub total_tokens: u64,
    /// Cost attributed to this response, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    /// Provider-specific usage detail, forwarded untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Error payload attached to a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Canonical response returned to callers
///
/// Downstream consumers assume `output`, `reasoning`, and `text` are
/// never null; transformation supplies empty-but-valid defaults when a
/// provider omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesResult {
    /// Response identifier
    pub id: String,
    /// Object type, always `response`
    #[serde(default = "default_object")]
    pub object: String,
    /// Creation time as epoch seconds
    ///
    /// Providers variously send an integer, a float, or camelCase
    /// `createdAt`; all normalize to the same integer, and re-parsing an
    /// already-canonical value leaves it unchanged.
    #[serde(alias = "createdAt", deserialize_with = "de_epoch_seconds")]
    pub created_at: i64,
    /// Lifecycle state
    pub status: ResponseStatus,
    /// Model that produced the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Ordered output items
    #[serde(default)]
    pub output: Vec<OutputItem>,
    /// Token accounting; populated only on terminal responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ResponseUsage>,
    /// Whether the provider persisted this response
    ///
    /// `None` means the provider did not say — never coerced to `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,
    /// Reasoning configuration echo
    #[serde(default = "default_empty_object")]
    pub reasoning: Value,
    /// Text format configuration echo
    #[serde(default = "default_empty_object")]
    pub text: Value,
    /// Error payload on failed responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
    /// Remaining provider fields (tools, metadata, instructions, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_object() -> String {
    "response".to_owned()
}

fn default_empty_object() -> Value {
    Value::Object(Map::new())
}

#[allow(clippy::cast_possible_truncation)]
fn de_epoch_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom("created_at out of range")),
        other => Err(serde::de::Error::custom(format!(
            "created_at must be numeric, got {other}"
        ))),
    }
}

impl ResponsesResult {
    /// Zero-valued usage for responses whose provider omitted the field
    #[must_use]
    pub fn zero_usage() -> ResponseUsage {
        ResponseUsage::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_float_created_at_normalizes_to_integer() {
        let raw = serde_json::json!({
            "id": "resp_1",
            "createdAt": 1_741_476_542.5,
            "status": "completed"
        });

        let result: ResponsesResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.created_at, 1_741_476_542);
    }

    #[test]
    fn created_at_parse_is_idempotent() {
        let raw = serde_json::json!({
            "id": "resp_1",
            "createdAt": 1_741_476_542.0,
            "status": "completed"
        });

        let once: ResponsesResult = serde_json::from_value(raw).unwrap();
        let twice: ResponsesResult = serde_json::from_value(serde_json::to_value(&once).unwrap()).unwrap();
        assert_eq!(once.created_at, twice.created_at);
    }

    #[test]
    fn absent_store_stays_none() {
        let raw = serde_json::json!({
            "id": "resp_1",
            "created_at": 1,
            "status": "completed"
        });

        let result: ResponsesResult = serde_json::from_value(raw).unwrap();
        assert!(result.store.is_none());

        let back = serde_json::to_value(&result).unwrap();
        assert!(back.get("store").is_none());
    }

    #[test]
    fn store_true_survives_round_trip() {
        let raw = serde_json::json!({
            "id": "resp_1",
            "created_at": 1,
            "status": "completed",
            "store": true
        });

        let result: ResponsesResult = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&result).unwrap();
        assert_eq!(back["store"], Value::Bool(true));
    }

    #[test]
    fn missing_collections_default_to_empty() {
        let raw = serde_json::json!({
            "id": "resp_1",
            "created_at": 1,
            "status": "in_progress"
        });

        let result: ResponsesResult = serde_json::from_value(raw).unwrap();
        assert!(result.output.is_empty());
        assert_eq!(result.reasoning, serde_json::json!({}));
        assert_eq!(result.text, serde_json::json!({}));
        assert!(result.usage.is_none());
    }
}
