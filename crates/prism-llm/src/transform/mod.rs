//! Shared transformation steps applied across providers
//!
//! Everything here is pure: raw JSON in, normalized JSON out. Provider
//! configs call into these instead of re-implementing per-provider
//! patches.

mod sanitize;
mod sse;
pub mod tools;

use serde_json::{Map, Value};

pub use sanitize::sanitize_chunk;
pub use sse::collapse_sse_body;

/// Normalize a raw provider response object in place so it deserializes
/// into the canonical schema
///
/// - `createdAt` (camelCase) and float timestamps become an integer
///   `created_at`
/// - fields the canonical schema requires as non-null objects get
///   empty-but-valid defaults (`reasoning`, `text`, `output`, zero usage)
/// - a missing `id` (seen on provider failure payloads) gets a synthetic
///   placeholder so the object is still addressable
pub fn normalize_response_value(value: &mut Value) {
    let Some(map) = value.as_object_mut() else { return };

    normalize_created_at(map);

    if !map.contains_key("id") || map["id"].is_null() {
        map.insert("id".to_owned(), Value::String(format!("resp_{}", uuid::Uuid::new_v4().simple())));
    }

    if map.get("status").is_none_or(Value::is_null) {
        let status = if map.get("error").is_some_and(|e| !e.is_null()) {
            "failed"
        } else {
            "completed"
        };
        map.insert("status".to_owned(), Value::String(status.to_owned()));
    }

    for key in ["reasoning", "text"] {
        if map.get(key).is_none_or(Value::is_null) {
            map.insert(key.to_owned(), Value::Object(Map::new()));
        }
    }

    if map.get("output").is_none_or(Value::is_null) {
        map.insert("output".to_owned(), Value::Array(Vec::new()));
    }

    if map.get("usage").is_none_or(Value::is_null) {
        map.insert(
            "usage".to_owned(),
            serde_json::json!({ "input_tokens": 0, "output_tokens": 0, "total_tokens": 0 }),
        );
    }
}

#[allow(clippy::cast_possible_truncation)]
fn normalize_created_at(map: &mut Map<String, Value>) {
    let raw = map
        .remove("created_at")
        .or_else(|| map.remove("createdAt"))
        .unwrap_or(Value::Null);

    let seconds = match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    };

    map.insert(
        "created_at".to_owned(),
        Value::from(seconds.unwrap_or_else(prism_oauth::now_epoch)),
    );
}

/// Restrict a request body to the keys a provider's endpoint accepts
///
/// Dropping happens even for keys inherited from shared request-building
/// code; the allowlist is the final word on what goes on the wire.
pub fn filter_body_to_allowed(body: &mut Value, allowed: &[&str]) {
    if let Some(map) = body.as_object_mut() {
        map.retain(|key, _| allowed.contains(&key.as_str()));
    }
}

/// Pull a human-readable message out of a provider error body
///
/// Accepts the common `{"error": {"message": ...}}` nesting, a flat
/// `{"message": ...}`, or falls back to the raw text.
#[must_use]
pub fn extract_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .map_or_else(|| body.to_owned(), ToOwned::to_owned)
}
