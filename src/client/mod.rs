//! MCP client over the SSE transport
//!
//! Mirrors what the server expects: open `GET /sse`, read the session id from
//! the `endpoint` event, run the `initialize` exchange, then POST requests
//! and pick their responses off the stream by id.
//!
//! ```no_run
//! use serde_json::json;
//! use sqlite_mcp_bridge::client::{ClientConfig, McpClient};
//!
//! # async fn demo() -> sqlite_mcp_bridge::McpResult<()> {
//! let mut client = McpClient::new(ClientConfig::new("http://localhost:8000"))?;
//! client.connect().await?;
//! let tables = client.call_tool("list_tables", json!({})).await?;
//! println!("{:?}", tables.first_text());
//! client.disconnect().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod listener;
mod pending;
mod sse;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::ACCEPT;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::constants::{CLIENT_PROTOCOL_VERSION, SESSION_QUERY_PARAM, SSE_PATH};
use crate::error::{BridgeError, McpResult};
use crate::protocol::{
    ClientInfo, ErrorObject, InitializeParams, JsonRpcMessage, JsonRpcRequest, ToolCallResult,
};

pub use config::ClientConfig;
pub use listener::{parse_endpoint, Endpoint};
pub use pending::{PendingResponses, Unanswered};
pub use sse::{SseDecoder, SseFrame};

use listener::Listener;

/// Where the connection is in its handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    StreamOpening,
    AwaitingSessionId,
    SessionEstablished,
    Initializing,
    Ready,
}

impl ConnectionState {
    /// States in which requests may be posted
    fn has_session(self) -> bool {
        matches!(
            self,
            Self::SessionEstablished | Self::Initializing | Self::Ready
        )
    }
}

struct Session {
    id: String,
    messages_url: reqwest::Url,
}

/// Client for one SSE session
pub struct McpClient {
    config: ClientConfig,
    http: reqwest::Client,
    state: Arc<Mutex<ConnectionState>>,
    pending: Arc<PendingResponses>,
    session: Option<Session>,
    listener: Option<Listener>,
    server_info: Option<Value>,
}

impl McpClient {
    pub fn new(config: ClientConfig) -> McpResult<Self> {
        // No overall timeout on the client: it would cut the event stream.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            pending: Arc::new(PendingResponses::new(config.retention)),
            config,
            http,
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            session: None,
            listener: None,
            server_info: None,
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    fn set_state(&self, state: ConnectionState) {
        debug!(?state, "connection state");
        *self.state.lock() = state;
    }

    /// Session id issued by the server, once the handshake got that far
    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    /// `initialize` result returned by the server
    pub fn server_info(&self) -> Option<&Value> {
        self.server_info.as_ref()
    }

    /// Responses received but not yet claimed
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Open the stream, establish the session and initialize.
    ///
    /// On any failure the listener is stopped and the client is left
    /// `Disconnected`; nothing is retried.
    pub async fn connect(&mut self) -> McpResult<()> {
        if self.state() != ConnectionState::Disconnected {
            return Err(BridgeError::connection("already connected"));
        }

        match self.handshake().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "connection attempt failed");
                self.teardown().await;
                Err(e)
            }
        }
    }

    async fn handshake(&mut self) -> McpResult<()> {
        let base = self.config.base()?;
        let sse_url = base
            .join(SSE_PATH)
            .map_err(|e| BridgeError::config(format!("invalid SSE URL: {e}")))?;
        let handshake_timeout = self.config.handshake_timeout;
        let waited_ms = handshake_timeout.as_millis() as u64;

        self.pending.reopen();
        self.set_state(ConnectionState::StreamOpening);
        let response = tokio::time::timeout(
            handshake_timeout,
            self.http
                .get(sse_url)
                .header(ACCEPT, "text/event-stream")
                .send(),
        )
        .await
        .map_err(|_| BridgeError::HandshakeTimeout { waited_ms })??
        .error_for_status()?;

        self.set_state(ConnectionState::AwaitingSessionId);
        let (endpoint_tx, endpoint_rx) = oneshot::channel();
        self.listener = Some(Listener::spawn(
            response,
            self.pending.clone(),
            self.state.clone(),
            endpoint_tx,
        ));

        let endpoint = match tokio::time::timeout(handshake_timeout, endpoint_rx).await {
            Err(_) => return Err(BridgeError::HandshakeTimeout { waited_ms }),
            Ok(Err(_)) => {
                return Err(BridgeError::connection(
                    "stream listener stopped during the handshake",
                ))
            }
            Ok(Ok(result)) => result?,
        };

        let mut messages_url = base
            .join(&endpoint.path)
            .map_err(|e| BridgeError::handshake(format!("invalid endpoint path: {e}")))?;
        messages_url.set_query(None);
        info!(session_id = %endpoint.session_id, "received session ID");

        self.session = Some(Session {
            id: endpoint.session_id,
            messages_url,
        });
        self.set_state(ConnectionState::SessionEstablished);

        self.set_state(ConnectionState::Initializing);
        let params = InitializeParams {
            protocol_version: CLIENT_PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: ClientInfo {
                name: self.config.client_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        let response = self
            .call_with_timeout(
                "initialize",
                serde_json::to_value(params)?,
                self.config.initialize_timeout,
            )
            .await?;
        if let Some(error) = response.error {
            return Err(rpc_error(error));
        }
        debug!(result = ?response.result, "initialization successful");
        self.server_info = response.result;

        self.notify("notifications/initialized", json!({})).await?;
        self.set_state(ConnectionState::Ready);
        info!("session ready");
        Ok(())
    }

    fn session(&self) -> McpResult<&Session> {
        if !self.state().has_session() {
            return Err(BridgeError::NotConnected);
        }
        self.session.as_ref().ok_or(BridgeError::NotConnected)
    }

    async fn post(&self, envelope: &JsonRpcRequest) -> McpResult<()> {
        let session = self.session()?;
        self.http
            .post(session.messages_url.clone())
            .query(&[(SESSION_QUERY_PARAM, session.id.as_str())])
            .timeout(self.config.call_timeout)
            .json(envelope)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Send a request and wait for its response with the default timeout
    pub async fn call(&self, method: &str, params: Value) -> McpResult<JsonRpcMessage> {
        self.call_with_timeout(method, params, self.config.call_timeout)
            .await
    }

    /// Send a request and wait up to `timeout` for the envelope with its id.
    ///
    /// Error envelopes count as matches and are returned as-is.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> McpResult<JsonRpcMessage> {
        let id = Uuid::new_v4().to_string();
        let request = JsonRpcRequest::new(id.clone(), method, params);
        self.post(&request).await?;
        debug!(%method, %id, "request sent");

        match self.pending.wait_for(&id, timeout).await {
            Ok(message) => Ok(message),
            Err(Unanswered::TimedOut) => Err(BridgeError::RequestTimeout {
                method: method.to_string(),
                id,
            }),
            Err(Unanswered::Closed) => Err(BridgeError::connection(format!(
                "event stream closed before the response to {method} request {id}"
            ))),
        }
    }

    /// Send a notification; nothing comes back for it
    pub async fn notify(&self, method: &str, params: Value) -> McpResult<()> {
        self.post(&JsonRpcRequest::notification(method, params)).await?;
        debug!(%method, "notification sent");
        Ok(())
    }

    /// Call a tool and decode its result.
    ///
    /// Only protocol errors fail here; a tool's own refusal is a normal
    /// result whose text says so. An unknown tool name fails with
    /// [`BridgeError::UnknownTool`].
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<ToolCallResult> {
        let response = self
            .call("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;

        if let Some(error) = response.error {
            return Err(rpc_error(error));
        }
        let result = response.result.ok_or_else(|| BridgeError::Rpc {
            code: -32603,
            message: "response carries neither result nor error".to_string(),
        })?;
        Ok(serde_json::from_value(result)?)
    }

    /// `list_tables` tool
    pub async fn list_tables(&self) -> McpResult<ToolCallResult> {
        self.call_tool("list_tables", json!({})).await
    }

    /// `execute_query` tool
    pub async fn execute_query(&self, query: &str) -> McpResult<ToolCallResult> {
        self.call_tool("execute_query", json!({ "query": query })).await
    }

    /// Stop the listener and forget the session
    pub async fn disconnect(&mut self) {
        self.teardown().await;
        info!("disconnected");
    }

    async fn teardown(&mut self) {
        self.set_state(ConnectionState::Disconnected);
        if let Some(listener) = self.listener.take() {
            listener.stop(self.config.shutdown_grace).await;
        }
        self.session = None;
        self.server_info = None;
        self.pending.close();
        self.pending.clear();
    }
}

/// Map an error member onto the client's error type
fn rpc_error(error: ErrorObject) -> BridgeError {
    let detail = |key: &str| {
        error
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    match error.code {
        -32602 => match (detail("tool"), detail("details")) {
            (Some(tool), _) => BridgeError::UnknownTool(tool),
            (None, Some(details)) => BridgeError::InvalidParams(details),
            (None, None) => BridgeError::InvalidParams(error.message),
        },
        code => BridgeError::Rpc {
            code,
            message: error.message,
        },
    }
}
