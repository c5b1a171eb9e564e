//! Error types for the SQLite MCP bridge.
//!
//! Protocol-level failures (transport, handshake, timeouts) are errors.
//! Backend failures and read-only rejections are not: tools turn those into
//! text results so they travel back as ordinary successful envelopes.

use thiserror::Error;

/// Result type for bridge operations
pub type McpResult<T> = Result<T, BridgeError>;

/// Errors raised by the server, the client and their shared plumbing.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Event stream unreachable or closed underneath us
    #[error("Connection error: {0}")]
    Connection(String),

    /// The endpoint announcement was missing or malformed
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// No endpoint event arrived in time
    #[error("Did not receive session ID from server within {waited_ms} ms")]
    HandshakeTimeout { waited_ms: u64 },

    /// No response matched a request before its deadline
    #[error("No response received for {method} request {id}")]
    RequestTimeout { method: String, id: String },

    #[error("Not connected or no session ID")]
    NotConnected,

    /// JSON-RPC error member returned by the peer
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl BridgeError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a handshake error.
    pub fn handshake(msg: impl Into<String>) -> Self {
        Self::Handshake(msg.into())
    }
}
