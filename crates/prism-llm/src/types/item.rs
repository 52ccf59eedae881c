use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Typed item in a request `input` sequence
///
/// The `Other` fallback keeps unrecognized item shapes intact so they
/// can be forwarded verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputItem {
    /// Conversation message
    Message {
        /// `user`, `assistant`, `system`, or `developer`
        role: String,
        /// Plain text or an array of typed content parts
        content: Value,
    },
    /// Tool invocation produced by the model on a previous turn
    FunctionCall {
        /// Call identifier the output refers back to
        call_id: String,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
        /// Item id assigned by the provider
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    /// Result the caller is feeding back for a tool invocation
    FunctionCallOutput {
        /// Call identifier this answers
        call_id: String,
        /// Tool output
        output: Value,
    },
    /// Reasoning item carried across turns
    ///
    /// `encrypted_content` must survive the round trip — stripping it
    /// breaks reasoning continuity on multi-turn conversations.
    Reasoning {
        /// Item id assigned by the provider
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Reasoning summary parts
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<Value>,
        /// Opaque provider-encrypted reasoning state
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encrypted_content: Option<String>,
    },
    /// Anything else, forwarded untouched
    #[serde(untagged)]
    Other(Value),
}

/// Typed item in a response `output` sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    /// Assistant message
    Message {
        /// Item id assigned by the provider
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Always `assistant`
        role: String,
        /// Completion status of this item
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
        /// Typed content parts
        content: Value,
    },
    /// Reasoning trace
    Reasoning {
        /// Item id assigned by the provider
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Reasoning summary parts
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<Value>,
        /// Opaque provider-encrypted reasoning state
        #[serde(default, skip_serializing_if = "Option::is_none")]
        encrypted_content: Option<String>,
    },
    /// Tool invocation requested by the model
    FunctionCall {
        /// Item id assigned by the provider
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Call identifier for the caller to answer
        call_id: String,
        /// Function name
        name: String,
        /// JSON-encoded arguments
        arguments: String,
        /// Completion status of this item
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },
    /// Anything else, forwarded untouched
    #[serde(untagged)]
    Other(Value),
}
