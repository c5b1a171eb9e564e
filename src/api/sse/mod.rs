//! SSE (Server-Sent Events) transport for MCP over HTTP
//!
//! ## Endpoints
//! - `GET /sse` - event stream; the first event is `endpoint`, naming the
//!   messages path and this stream's session id
//! - `POST /messages/?session_id=<id>` - JSON-RPC envelopes from the client;
//!   acknowledged with 202, answered as `message` events on the stream

pub mod handler;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use crate::constants::DEFAULT_KEEP_ALIVE_SECS;
use crate::server::McpServer;

pub use handler::endpoint_url;
pub use session::{ClientSession, SessionManager};

/// Shared state for SSE endpoints
pub struct SseState {
    /// Request dispatcher with its tools
    pub server: Arc<McpServer>,
    /// Connected streams
    pub sessions: SessionManager,
    /// Interval between keep-alive comments
    pub keep_alive: Duration,
}

impl SseState {
    pub fn new(server: McpServer) -> Self {
        Self {
            server: Arc::new(server),
            sessions: SessionManager::new(),
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
        }
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }
}
