//! Shared constants for the server and the client.

use std::time::Duration;

/// JSON-RPC version tag carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol versions the server will echo back from `initialize`
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26"];

/// Version returned when the client asks for one we do not speak
pub const LATEST_PROTOCOL_VERSION: &str = "2025-03-26";

/// Version the client requests during the handshake
pub const CLIENT_PROTOCOL_VERSION: &str = "2024-11-05";

/// Path of the event stream
pub const SSE_PATH: &str = "/sse";

/// Path the client posts envelopes to
pub const MESSAGES_PATH: &str = "/messages/";

/// Query parameter linking a POST to its event stream
pub const SESSION_QUERY_PARAM: &str = "session_id";

/// SSE event announcing the messages endpoint
pub const ENDPOINT_EVENT: &str = "endpoint";

/// SSE event carrying a JSON-RPC envelope
pub const MESSAGE_EVENT: &str = "message";

// =============================================================================
// Server defaults
// =============================================================================

pub const DEFAULT_SERVER_NAME: &str = "sqlite-mcp-server";

pub const DEFAULT_DB_PATH: &str = "/database/properties.db";

pub const DEFAULT_HTTP_HOST: &str = "0.0.0.0";

pub const DEFAULT_HTTP_PORT: u16 = 8000;

pub const DEFAULT_KEEP_ALIVE_SECS: u64 = 15;

/// Outbound messages buffered per SSE connection
pub const SESSION_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Client defaults
// =============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const DEFAULT_CLIENT_NAME: &str = "mcp-test-client";

/// Wait for the endpoint event
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for the `initialize` response
pub const DEFAULT_INITIALIZE_TIMEOUT: Duration = Duration::from_secs(5);

/// Wait for a `tools/call` response
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

/// Grace period for the stream listener to stop on disconnect
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Upper bound accepted for `MCP_CALL_TIMEOUT_SECS` (one day)
pub const MAX_CALL_TIMEOUT_SECS: u64 = 86_400;

/// Longest event stream line the client buffers
pub const MAX_SSE_LINE_BYTES: usize = 16 * 1024 * 1024;
