//! Client configuration.

use std::time::Duration;

use crate::constants::{
    DEFAULT_BASE_URL, DEFAULT_CALL_TIMEOUT, DEFAULT_CLIENT_NAME, DEFAULT_CONNECT_TIMEOUT,
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_INITIALIZE_TIMEOUT, DEFAULT_SHUTDOWN_GRACE,
    MAX_CALL_TIMEOUT_SECS,
};
use crate::error::{BridgeError, McpResult};

/// Where to connect and how long to wait at each step
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Name sent in `clientInfo`
    pub client_name: String,

    /// Wait for the `endpoint` event
    pub handshake_timeout: Duration,

    /// Wait for the `initialize` response
    pub initialize_timeout: Duration,

    /// Default wait for any other response
    pub call_timeout: Duration,

    /// How long `disconnect` waits for the listener to stop
    pub shutdown_grace: Duration,

    /// TCP connect timeout for every HTTP request
    pub connect_timeout: Duration,

    /// Unclaimed responses older than this are evicted
    pub retention: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            initialize_timeout: DEFAULT_INITIALIZE_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retention: DEFAULT_CALL_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with default timeouts
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Load from `MCP_BASE_URL` and `MCP_CALL_TIMEOUT_SECS`.
    pub fn from_env() -> McpResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// The call timeout must be between 1 second and one day.
    pub fn from_lookup<F>(lookup: F) -> McpResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("MCP_BASE_URL") {
            config.base_url = url;
        }

        if let Some(secs) = lookup("MCP_CALL_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .ok()
                .filter(|s| (1..=MAX_CALL_TIMEOUT_SECS).contains(s))
                .ok_or_else(|| {
                    BridgeError::config(format!(
                        "MCP_CALL_TIMEOUT_SECS must be 1..={MAX_CALL_TIMEOUT_SECS}, got '{secs}'"
                    ))
                })?;
            config.call_timeout = Duration::from_secs(secs);
            config.retention = config.call_timeout;
        }

        Ok(config)
    }

    /// Base URL as a parsed `reqwest::Url`
    pub fn base(&self) -> McpResult<reqwest::Url> {
        reqwest::Url::parse(&self.base_url)
            .map_err(|e| BridgeError::config(format!("invalid base URL '{}': {e}", self.base_url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_mirror_harness_timeouts() {
        let config = ClientConfig::default();
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.initialize_timeout, Duration::from_secs(5));
        assert_eq!(config.call_timeout, Duration::from_secs(15));
        assert_eq!(config.shutdown_grace, Duration::from_secs(2));
    }

    #[test]
    fn test_base_url_validation() {
        assert!(ClientConfig::new("http://127.0.0.1:8000").base().is_ok());
        assert!(ClientConfig::new("not a url").base().is_err());
    }

    #[test]
    fn test_call_timeout_from_lookup() {
        let config = ClientConfig::from_lookup(|key| match key {
            "MCP_BASE_URL" => Some("http://10.0.0.2:9000".to_string()),
            "MCP_CALL_TIMEOUT_SECS" => Some("30".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:9000");
        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.retention, Duration::from_secs(30));
    }

    #[test]
    fn test_out_of_range_call_timeout_rejected() {
        for raw in ["0", "18446744073709551615", "86401", "soon"] {
            let result = ClientConfig::from_lookup(|key| {
                (key == "MCP_CALL_TIMEOUT_SECS").then(|| raw.to_string())
            });
            assert!(matches!(result, Err(BridgeError::Config(_))), "{raw}");
        }
    }
}
