use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::InputItem;
use super::params::OptionalParams;

/// Request `input`: either a bare prompt string or an ordered item list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseInput {
    /// Single prompt string
    Text(String),
    /// Ordered sequence of typed items
    Items(Vec<InputItem>),
}

impl ResponseInput {
    /// Render the input as the plain JSON the wire formats expect,
    /// stripping any internal wrapper representation
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Items(items) => Value::Array(
                items
                    .iter()
                    .map(|item| serde_json::to_value(item).unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }
}

/// Canonical inbound request
///
/// `model` may carry a provider prefix (`azure/gpt-4o`); everything that
/// is not `model`, `input`, or `stream` lands in `params` and is subject
/// to per-provider allowlisting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Target model, optionally provider-prefixed
    pub model: String,
    /// Prompt or conversation items
    pub input: ResponseInput,
    /// Whether the caller wants a streaming response
    #[serde(default)]
    pub stream: bool,
    /// All remaining request parameters
    #[serde(flatten)]
    pub params: OptionalParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_collect_into_params() {
        let raw = serde_json::json!({
            "model": "xai/grok-4-fast",
            "input": "hi",
            "temperature": 0.2,
            "tools": [{"type": "web_search"}]
        });

        let request: ResponsesRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.model, "xai/grok-4-fast");
        assert!(!request.stream);
        assert!(request.params.contains("temperature"));
        assert!(request.params.contains("tools"));
        assert!(!request.params.contains("model"));
    }

    #[test]
    fn item_input_renders_as_plain_maps() {
        let input = ResponseInput::Items(vec![InputItem::Message {
            role: "user".to_owned(),
            content: Value::String("hello".to_owned()),
        }]);

        let wire = input.to_wire();
        assert_eq!(
            wire,
            serde_json::json!([{ "type": "message", "role": "user", "content": "hello" }])
        );
    }
}
