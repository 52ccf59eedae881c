use serde_json::Value;

/// Event types that carry positional fields the schema requires non-null
const POSITIONAL_EVENTS: &[&str] = &[
    "response.output_item.added",
    "response.output_item.done",
    "response.output_text.delta",
    "response.output_text.done",
    "response.content_part.added",
    "response.content_part.done",
    "response.function_call_arguments.delta",
    "response.function_call_arguments.done",
];

/// Coalesce missing or null fields in a raw stream chunk before it is
/// turned into a typed event
///
/// Upstream providers omit `output_index`/`content_index` (and `code` on
/// error payloads) often enough that strict validation would abort whole
/// streams over cosmetic gaps. One sanitize pass here replaces the
/// per-provider patching that would otherwise accumulate at call sites.
pub fn sanitize_chunk(chunk: &mut Value) {
    let Some(map) = chunk.as_object_mut() else { return };

    let event_type = map.get("type").and_then(Value::as_str).unwrap_or_default().to_owned();

    if POSITIONAL_EVENTS.contains(&event_type.as_str()) {
        for key in ["output_index", "content_index"] {
            if map.get(key).is_none_or(Value::is_null) {
                map.insert(key.to_owned(), Value::from(0));
            }
        }
    }

    if event_type == "error" {
        if map.get("code").is_none_or(Value::is_null) {
            map.insert("code".to_owned(), Value::String("unknown_error".to_owned()));
        }
        if map.get("message").is_none_or(Value::is_null) {
            map.insert("message".to_owned(), Value::String(String::new()));
        }
    }
}
