//! Background task reading the event stream.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::pending::PendingResponses;
use super::sse::{SseDecoder, SseFrame};
use super::ConnectionState;
use crate::constants::{ENDPOINT_EVENT, MESSAGE_EVENT, SESSION_QUERY_PARAM};
use crate::error::{BridgeError, McpResult};
use crate::protocol::JsonRpcMessage;

/// Where the server told us to post, from the `endpoint` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub path: String,
    pub session_id: String,
}

/// Parse `<path>?session_id=<id>`; `None` when the id is missing or empty.
pub fn parse_endpoint(data: &str) -> Option<Endpoint> {
    let (path, query) = data.trim().split_once('?')?;
    let session_id = query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != SESSION_QUERY_PARAM {
            return None;
        }
        urlencoding::decode(value).ok().map(|v| v.into_owned())
    })?;

    if session_id.is_empty() {
        return None;
    }
    Some(Endpoint {
        path: path.to_string(),
        session_id,
    })
}

type EndpointSender = oneshot::Sender<McpResult<Endpoint>>;

/// Handle to the running listener task
pub(crate) struct Listener {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl Listener {
    /// Start reading `response` as an event stream.
    ///
    /// The first `endpoint` event (or the reason there was none) is sent
    /// on `endpoint_tx`; `message` events go to `pending`.
    pub(crate) fn spawn(
        response: reqwest::Response,
        pending: Arc<PendingResponses>,
        state: Arc<Mutex<ConnectionState>>,
        endpoint_tx: EndpointSender,
    ) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(listen(response, pending, state, endpoint_tx, shutdown_rx));
        Self { handle, shutdown }
    }

    /// Ask the task to stop and wait up to `grace` for it.
    ///
    /// Returns false when the task had to be abandoned.
    pub(crate) async fn stop(mut self, grace: Duration) -> bool {
        let _ = self.shutdown.send(true);
        match tokio::time::timeout(grace, &mut self.handle).await {
            Ok(_) => true,
            Err(_) => {
                warn!(
                    grace_ms = grace.as_millis() as u64,
                    "stream listener did not stop in time, abandoning it"
                );
                false
            }
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn listen(
    response: reqwest::Response,
    pending: Arc<PendingResponses>,
    state: Arc<Mutex<ConnectionState>>,
    endpoint_tx: EndpointSender,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut endpoint_tx = Some(endpoint_tx);
    let mut requested = false;

    loop {
        if *shutdown.borrow() {
            requested = true;
            break;
        }

        let chunk = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    requested = true;
                    break;
                }
                continue;
            }
            chunk = stream.next() => chunk,
        };

        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                warn!(error = %e, "error in SSE listener");
                break;
            }
            None => {
                debug!("event stream closed by server");
                break;
            }
        };

        for frame in decoder.feed(&bytes) {
            handle_frame(frame, &pending, &mut endpoint_tx);
        }
    }

    if let Some(tx) = endpoint_tx.take() {
        let _ = tx.send(Err(BridgeError::connection(
            "event stream ended before the endpoint event",
        )));
    }

    if !requested {
        info!("event stream lost");
        *state.lock() = ConnectionState::Disconnected;
        pending.close();
    }
}

fn handle_frame(
    frame: SseFrame,
    pending: &PendingResponses,
    endpoint_tx: &mut Option<EndpointSender>,
) {
    match frame.event.as_str() {
        ENDPOINT_EVENT => {
            let Some(tx) = endpoint_tx.take() else {
                warn!(data = %frame.data, "ignoring repeated endpoint event");
                return;
            };
            let result = parse_endpoint(&frame.data).ok_or_else(|| {
                error!(data = %frame.data, "could not parse session ID from endpoint event");
                BridgeError::handshake(format!(
                    "endpoint event carries no session id: {}",
                    frame.data
                ))
            });
            let _ = tx.send(result);
        }
        MESSAGE_EVENT => match serde_json::from_str::<JsonRpcMessage>(&frame.data) {
            Ok(message) => {
                if !pending.push(message) {
                    debug!("ignoring message without a response id");
                }
            }
            Err(e) => debug!(error = %e, "skipping undecodable message"),
        },
        other => debug!(event = other, "ignoring event"),
    }
}
