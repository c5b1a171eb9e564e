//! Protocol types for MCP and JSON-RPC communication
//!
//! This module contains all protocol-related types and traits.

mod jsonrpc;
mod mcp;

pub use jsonrpc::{
    id_key, ErrorObject, JsonRpcError, JsonRpcMessage, JsonRpcRequest, JsonRpcResponse,
};
pub use mcp::{
    ClientInfo, ContentItem, InitializeParams, McpTool, ServerInfo, Tool, ToolCallResult,
};
