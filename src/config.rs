//! Configuration management for the SQLite MCP server.
//!
//! Configuration is loaded from environment variables following the 12-factor app pattern.

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DB_PATH, DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_KEEP_ALIVE_SECS,
    DEFAULT_SERVER_NAME,
};
use crate::error::{BridgeError, McpResult};

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported in `initialize`
    pub server_name: String,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Transport to serve on
    pub transport: TransportType,

    /// HTTP settings (only used for the SSE transport)
    pub http: HttpConfig,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path of the SQLite file, opened read-only per call
    pub path: PathBuf,
}

/// Available transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportType {
    /// HTTP with Server-Sent Events (default).
    Sse,

    /// Newline-delimited JSON-RPC over stdin/stdout.
    Stdio,
}

impl std::str::FromStr for TransportType {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sse" | "http" => Ok(TransportType::Sse),
            "stdio" | "standard" | "io" => Ok(TransportType::Stdio),
            _ => Err(BridgeError::config(format!("invalid transport type: '{s}'"))),
        }
    }
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Sse => write!(f, "sse"),
            TransportType::Stdio => write!(f, "stdio"),
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Enable permissive CORS.
    pub enable_cors: bool,

    /// Enable request tracing via tower-http TraceLayer.
    pub enable_tracing: bool,

    /// Interval between SSE keep-alive comments.
    pub keep_alive: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            enable_cors: true,
            enable_tracing: true,
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
        }
    }
}

impl HttpConfig {
    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            database: DatabaseConfig {
                path: PathBuf::from(DEFAULT_DB_PATH),
            },
            transport: TransportType::Sse,
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// - `DB_PATH`: SQLite file (default `/database/properties.db`)
    /// - `MCP_TRANSPORT`: `sse` or `stdio`
    /// - `MCP_SERVER_NAME`
    /// - `MCP_HTTP_HOST`, `MCP_HTTP_PORT`
    /// - `MCP_HTTP_CORS`, `MCP_HTTP_TRACING`: `true`/`1` to enable
    /// - `MCP_SSE_KEEP_ALIVE_SECS`
    pub fn from_env() -> McpResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> McpResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("DB_PATH") {
            if path.trim().is_empty() {
                return Err(BridgeError::config("DB_PATH must not be empty"));
            }
            config.database.path = PathBuf::from(path);
        }

        if let Some(transport) = lookup("MCP_TRANSPORT") {
            config.transport = transport.parse()?;
        }

        if let Some(name) = lookup("MCP_SERVER_NAME") {
            config.server_name = name;
        }

        if let Some(host) = lookup("MCP_HTTP_HOST") {
            config.http.host = host;
        }

        if let Some(port) = lookup("MCP_HTTP_PORT") {
            config.http.port = port
                .parse()
                .map_err(|_| BridgeError::config(format!("invalid MCP_HTTP_PORT: '{port}'")))?;
        }

        if let Some(cors) = lookup("MCP_HTTP_CORS") {
            config.http.enable_cors = parse_flag(&cors);
        }

        if let Some(tracing) = lookup("MCP_HTTP_TRACING") {
            config.http.enable_tracing = parse_flag(&tracing);
        }

        if let Some(secs) = lookup("MCP_SSE_KEEP_ALIVE_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                BridgeError::config(format!("invalid MCP_SSE_KEEP_ALIVE_SECS: '{secs}'"))
            })?;
            if secs == 0 {
                return Err(BridgeError::config("MCP_SSE_KEEP_ALIVE_SECS must be positive"));
            }
            config.http.keep_alive = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}
