//! Helpers shared by the request handlers and the tools.

use serde_json::{json, Map, Value};

/// Tool arguments from `tools/call` params, `{}` when absent
pub fn extract_arguments(params: &Value) -> Value {
    params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Tool name from `tools/call` params
pub fn extract_tool_name(params: &Value) -> Option<&str> {
    params.get("name").and_then(|v| v.as_str())
}

/// A successful tool result with a single text item.
///
/// Read-only rejections and backend failures use this too: they are
/// answers, not faults.
pub fn text_response(text: String) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false
    })
}

/// A tool result flagged as an error, for calls the tool could not attempt
pub fn error_response(message: String) -> Value {
    json!({
        "content": [{ "type": "text", "text": format!("Error: {message}") }],
        "isError": true
    })
}
