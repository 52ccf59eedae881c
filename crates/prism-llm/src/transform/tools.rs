//! Structural remapping of tool definitions into provider schemas

use serde_json::{Map, Value};

/// Documented provider limit on web-search domain filters
const MAX_ALLOWED_DOMAINS: usize = 5;

/// Documented provider limit on web-search handle filters
const MAX_X_HANDLES: usize = 10;

/// Reshape a canonical web-search tool into the filter-based schema
///
/// `allowed_domains`/`excluded_domains`/`x_handles` move under a nested
/// `filters` object; `search_context_size` has no equivalent and is
/// dropped; list lengths are capped at the documented limits as a
/// best-effort client-side guard (the provider still enforces its own).
#[must_use]
pub fn remap_web_search_tool(tool: &Map<String, Value>) -> Map<String, Value> {
    let mut mapped = Map::new();
    mapped.insert(
        "type".to_owned(),
        tool.get("type").cloned().unwrap_or_else(|| Value::String("web_search".to_owned())),
    );

    let mut filters = Map::new();
    move_capped_list(tool, &mut filters, "allowed_domains", MAX_ALLOWED_DOMAINS);
    move_capped_list(tool, &mut filters, "excluded_domains", MAX_ALLOWED_DOMAINS);
    move_capped_list(tool, &mut filters, "x_handles", MAX_X_HANDLES);

    if !filters.is_empty() {
        mapped.insert("filters".to_owned(), Value::Object(filters));
    }

    // Everything else the filter schema recognizes passes through;
    // search_context_size and unrecognized keys do not
    if let Some(location) = tool.get("user_location") {
        mapped.insert("user_location".to_owned(), location.clone());
    }

    mapped
}

fn move_capped_list(source: &Map<String, Value>, target: &mut Map<String, Value>, key: &str, cap: usize) {
    let Some(Value::Array(items)) = source.get(key) else {
        return;
    };

    if items.len() > cap {
        tracing::warn!(key, len = items.len(), cap, "truncating web search filter list to documented limit");
    }

    target.insert(key.to_owned(), Value::Array(items.iter().take(cap).cloned().collect()));
}

/// Whether a tool definition is a web-search variant
#[must_use]
pub fn is_web_search_tool(tool: &Value) -> bool {
    tool.get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.starts_with("web_search"))
}

/// Ensure a code-interpreter tool carries the container field its
/// endpoint requires, defaulting to an auto-provisioned one
#[must_use]
pub fn ensure_code_interpreter_container(tool: &Map<String, Value>) -> Map<String, Value> {
    let mut mapped = tool.clone();
    if mapped.get("container").is_none_or(Value::is_null) {
        mapped.insert("container".to_owned(), serde_json::json!({ "type": "auto" }));
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn web_search_moves_domains_under_filters() {
        let tool = as_map(serde_json::json!({
            "type": "web_search",
            "search_context_size": "high",
            "allowed_domains": ["wikipedia.org"]
        }));

        let mapped = remap_web_search_tool(&tool);
        assert_eq!(mapped["type"], "web_search");
        assert!(mapped.get("search_context_size").is_none());
        assert_eq!(mapped["filters"]["allowed_domains"], serde_json::json!(["wikipedia.org"]));
    }

    #[test]
    fn domain_list_is_capped_at_five() {
        let domains: Vec<Value> = (0..8).map(|i| Value::String(format!("site{i}.org"))).collect();
        let tool = as_map(serde_json::json!({ "type": "web_search", "allowed_domains": domains }));

        let mapped = remap_web_search_tool(&tool);
        assert_eq!(mapped["filters"]["allowed_domains"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn handle_list_is_capped_at_ten() {
        let handles: Vec<Value> = (0..12).map(|i| Value::String(format!("@user{i}"))).collect();
        let tool = as_map(serde_json::json!({ "type": "web_search", "x_handles": handles }));

        let mapped = remap_web_search_tool(&tool);
        assert_eq!(mapped["filters"]["x_handles"].as_array().unwrap().len(), 10);
    }

    #[test]
    fn tool_without_filterable_fields_has_no_filters_object() {
        let tool = as_map(serde_json::json!({ "type": "web_search" }));
        let mapped = remap_web_search_tool(&tool);
        assert!(mapped.get("filters").is_none());
    }

    #[test]
    fn code_interpreter_gets_auto_container() {
        let tool = as_map(serde_json::json!({ "type": "code_interpreter" }));
        let mapped = ensure_code_interpreter_container(&tool);
        assert_eq!(mapped["container"]["type"], "auto");

        let explicit = as_map(serde_json::json!({ "type": "code_interpreter", "container": "cntr_1" }));
        assert_eq!(ensure_code_interpreter_container(&explicit)["container"], "cntr_1");
    }
}
