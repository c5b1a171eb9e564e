//! MCP Server implementation
//!
//! `McpServer` owns the tool registry and turns one JSON-RPC envelope into at
//! most one response envelope. It knows nothing about transports: the SSE
//! handlers and the stdio loop below both feed it.

mod handlers;

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::constants::{LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};
use crate::error::McpResult;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpTool, ServerInfo, Tool};

pub use handlers::*;

/// MCP Server dispatching JSON-RPC requests to registered tools
pub struct McpServer {
    server_info: ServerInfo,
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl McpServer {
    /// Create a new MCP server with default settings
    pub fn new() -> Self {
        Self::with_info(ServerInfo::default())
    }

    /// Create a new MCP server with custom server info
    pub fn with_info(info: ServerInfo) -> Self {
        Self {
            server_info: info,
            tools: HashMap::new(),
        }
    }

    /// Register a tool with the server
    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        let name = tool.definition().name.clone();
        self.tools.insert(name, tool);
        self
    }

    /// Get the number of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    pub fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    /// Parse and handle one raw envelope.
    ///
    /// Unparseable input gets a parse error response with a null id.
    pub fn handle_message(&self, raw: &str) -> Option<Value> {
        match serde_json::from_str::<JsonRpcRequest>(raw) {
            Ok(request) => self.handle_request(request),
            Err(e) => to_value(JsonRpcError::parse_error(Value::Null, e.to_string())),
        }
    }

    /// Handle a single JSON-RPC request.
    ///
    /// Returns `None` for notifications, whatever their method.
    pub fn handle_request(&self, request: JsonRpcRequest) -> Option<Value> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request);
            return None;
        };

        if !request.is_valid() {
            return to_value(JsonRpcError::invalid_request(
                id,
                "jsonrpc must be '2.0'".to_string(),
            ));
        }

        debug!(method = %request.method, "handling request");
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize(id.clone(), request.params)),
            "tools/list" => Ok(self.handle_tools_list(id.clone())),
            "tools/call" => self.handle_tool_call(id.clone(), request.params),
            "ping" => Ok(JsonRpcResponse::new(id.clone(), json!({}))),
            _ => Err(JsonRpcError::method_not_found(id, request.method.clone())),
        };

        match outcome {
            Ok(response) => to_value(response),
            Err(error) => to_value(error),
        }
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => debug!("client initialized"),
            other => debug!(method = other, "ignoring notification"),
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let requested = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str());
        let protocol_version = negotiate_protocol_version(requested);

        let result = json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": self.server_info.name,
                "version": self.server_info.version
            }
        });
        JsonRpcResponse::new(id, result)
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        let mut tools: Vec<McpTool> = self.tools.values().map(|t| t.definition()).collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        JsonRpcResponse::new(id, json!({ "tools": tools }))
    }

    /// Handle tools/call request
    fn handle_tool_call(
        &self,
        id: Value,
        params: Option<Value>,
    ) -> Result<JsonRpcResponse, JsonRpcError> {
        let params = params.ok_or_else(|| {
            JsonRpcError::invalid_params(id.clone(), "Missing parameters".to_string())
        })?;

        let tool_name = extract_tool_name(&params).ok_or_else(|| {
            JsonRpcError::invalid_params(id.clone(), "Missing tool name".to_string())
        })?;

        let tool = self.tools.get(tool_name).ok_or_else(|| {
            JsonRpcError::new(
                id.clone(),
                -32602,
                "Unknown tool".to_string(),
                Some(json!({"tool": tool_name})),
            )
        })?;

        match tool.execute(extract_arguments(&params)) {
            Ok(result) => Ok(JsonRpcResponse::new(id, result)),
            Err(e) => {
                warn!(tool = tool_name, error = %e, "tool execution failed");
                Err(JsonRpcError::new(
                    id,
                    -32603,
                    "Tool execution error".to_string(),
                    Some(json!({"details": e.to_string()})),
                ))
            }
        }
    }

    /// Serve newline-delimited JSON-RPC until `reader` is exhausted
    pub fn run<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> McpResult<()> {
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                if let Some(response) = self.handle_message(trimmed) {
                    writeln!(writer, "{}", serde_json::to_string(&response)?)?;
                    writer.flush()?;
                }
            }
            line.clear();
        }
        Ok(())
    }

    /// Run the server over stdin/stdout (blocking)
    pub fn run_stdio(&self) -> McpResult<()> {
        self.run(BufReader::new(io::stdin()), BufWriter::new(io::stdout()))
    }
}

impl Default for McpServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Echo the requested version when we speak it, else offer our latest.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|v| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|s| **s == v))
        .copied()
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

fn to_value<T: serde::Serialize>(envelope: T) -> Option<Value> {
    match serde_json::to_value(envelope) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "failed to encode response");
            None
        }
    }
}
