//! SSE and MCP HTTP handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::session::SessionManager;
use super::SseState;
use crate::constants::{ENDPOINT_EVENT, MESSAGES_PATH, MESSAGE_EVENT, SESSION_QUERY_PARAM};
use crate::protocol::JsonRpcRequest;

/// Removes its session when the stream that owns it is dropped
struct SessionGuard {
    state: Arc<SseState>,
    session_id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.state.sessions.remove_session(&self.session_id) {
            info!(session_id = %self.session_id, "SSE client disconnected");
        }
    }
}

/// Data of the `endpoint` event for `session_id`
pub fn endpoint_url(session_id: &str) -> String {
    format!("{MESSAGES_PATH}?{SESSION_QUERY_PARAM}={session_id}")
}

/// GET /sse - SSE stream for server→client events
pub async fn sse_handler(State(state): State<Arc<SseState>>) -> impl IntoResponse {
    let (session, mut rx) = state.sessions.create_session();
    info!(session_id = %session.session_id, "SSE client connected");

    let endpoint = endpoint_url(&session.session_id);
    let guard = SessionGuard {
        state: state.clone(),
        session_id: session.session_id,
    };

    let stream = async_stream::stream! {
        let _guard = guard;

        // Tells the client where to POST messages
        yield Ok::<_, Infallible>(Event::default().event(ENDPOINT_EVENT).data(endpoint));

        while let Some(message) = rx.recv().await {
            yield Ok(Event::default().event(MESSAGE_EVENT).data(message));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default().interval(state.keep_alive))
}

/// Query parameters of POST /messages/
#[derive(Debug, Deserialize)]
pub struct MessageParams {
    pub session_id: Option<String>,
}

/// POST /messages/ - accept one envelope, answer on the event stream
pub async fn messages_handler(
    State(state): State<Arc<SseState>>,
    Query(params): Query<MessageParams>,
    body: Bytes,
) -> Response {
    let Some(raw_id) = params.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };

    let Some(session_id) = SessionManager::parse_session_id(&raw_id) else {
        warn!(session_id = %raw_id, "rejected malformed session id");
        return (StatusCode::BAD_REQUEST, "Invalid session ID").into_response();
    };

    let Some(session) = state.sessions.get_session(&session_id) else {
        warn!(%session_id, "no such session");
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!(%session_id, error = %e, "could not parse message");
            return (StatusCode::BAD_REQUEST, "Could not parse message").into_response();
        }
    };

    debug!(%session_id, method = %request.method, "message received");
    let server = state.server.clone();
    let sender = session.sender();
    tokio::spawn(async move {
        let method = request.method.clone();
        match tokio::task::spawn_blocking(move || server.handle_request(request)).await {
            Ok(Some(response)) => match serde_json::to_string(&response) {
                Ok(text) => {
                    if sender.send(text).await.is_err() {
                        debug!(%method, "session closed before the response was delivered");
                    }
                }
                Err(e) => error!(%method, error = %e, "failed to encode response"),
            },
            Ok(None) => {}
            Err(e) => error!(%method, error = %e, "request handler failed"),
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "message received" })),
    )
        .into_response()
}

/// GET / - liveness banner
pub async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "message": "MCP Server is running. Connect to the /sse endpoint."
    }))
}

/// GET /health - server info
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: String,
    pub version: String,
    pub transport: &'static str,
    pub tool_count: usize,
    pub active_sessions: usize,
}

pub async fn health_handler(State(state): State<Arc<SseState>>) -> impl IntoResponse {
    let info = state.server.server_info();
    Json(HealthResponse {
        status: "healthy",
        name: info.name.clone(),
        version: info.version.clone(),
        transport: "sse",
        tool_count: state.server.tool_count(),
        active_sessions: state.sessions.session_count(),
    })
}
