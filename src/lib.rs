//! SQLite MCP Bridge
//!
//! A read-only SQLite server speaking the Model Context Protocol (MCP) over
//! the SSE transport, plus the client used to exercise it.
//!
//! # Features
//!
//! - **2 MCP Tools**: `list_tables` and `execute_query` (SELECT only)
//! - **SSE Transport**: `GET /sse` event stream, `POST /messages/` requests,
//!   linked by a server-issued session id
//! - **Stdio Transport**: the same dispatcher over stdin/stdout
//! - **Client**: session handshake plus request/response correlation by id
//!
//! # Modules
//!
//! - `protocol`: MCP and JSON-RPC protocol types
//! - `database`: SQLite backend and the read-only statement policy
//! - `tools`: the MCP tool implementations
//! - `server`: transport-independent request dispatcher
//! - `api`: axum router and SSE session handling
//! - `client`: SSE client, stream decoder and pending-response buffer
//! - `config`, `constants`, `error`: ambient plumbing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use sqlite_mcp_bridge::{McpServer, SqliteDatabase};
//! use sqlite_mcp_bridge::tools::register_all_tools;
//!
//! fn main() {
//!     let db = Arc::new(SqliteDatabase::new("/database/properties.db"));
//!     let mut server = McpServer::new();
//!     register_all_tools(&mut server, db);
//!     server.run_stdio().unwrap();
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

// Re-export commonly used items at crate root
pub use client::{ClientConfig, ConnectionState, McpClient};
pub use config::{Config, TransportType};
pub use database::SqliteDatabase;
pub use error::{BridgeError, McpResult};
pub use protocol::{McpTool, ServerInfo, Tool};
pub use server::McpServer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
