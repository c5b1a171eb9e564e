//! MCP (Model Context Protocol) types

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_SERVER_NAME;
use crate::error::McpResult;

/// MCP Tool definition
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl McpTool {
    /// Create a new MCP tool definition
    pub fn new(name: String, description: String, input_schema: Value) -> Self {
        Self {
            name,
            description,
            input_schema,
        }
    }
}

/// Server information for MCP handshake
#[derive(Clone, Debug)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    /// Create new server info
    pub fn new(name: String, version: String) -> Self {
        Self { name, version }
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client identity sent in `initialize`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Parameters of the `initialize` request
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: ClientInfo,
}

/// One item of a tool result's `content` array
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ContentItem {
    #[serde(rename = "type", default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub text: String,
}

fn default_content_type() -> String {
    "text".to_string()
}

/// Decoded `tools/call` result
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolCallResult {
    /// Text of the first content item, the shape both tools reply with
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|item| item.text.as_str())
    }
}

/// Trait for MCP tools
///
/// All tools must implement this trait to be registered with the MCP server.
/// `execute` may block on database I/O; the SSE transport runs it on the
/// blocking pool.
pub trait Tool: Send + Sync {
    /// Get the tool definition for tools/list
    fn definition(&self) -> McpTool;

    /// Execute the tool with the given parameters
    fn execute(&self, params: Value) -> McpResult<Value>;

    /// Get the tool name (convenience method)
    fn name(&self) -> String {
        self.definition().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_initialize_params_use_camel_case() {
        let params = InitializeParams {
            protocol_version: "0.1.0".to_string(),
            capabilities: json!({}),
            client_info: ClientInfo {
                name: "mcp-test-client".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["protocolVersion"], "0.1.0");
        assert_eq!(value["clientInfo"]["name"], "mcp-test-client");
    }

    #[test]
    fn test_tool_call_result_tolerates_missing_fields() {
        let result: ToolCallResult =
            serde_json::from_value(json!({"content": [{"text": "[]"}]})).unwrap();
        assert!(!result.is_error);
        assert_eq!(result.first_text(), Some("[]"));
        assert_eq!(result.content[0].content_type, "text");
    }
}
