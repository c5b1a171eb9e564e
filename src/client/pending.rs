//! Buffer of responses waiting to be claimed by their requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

use crate::protocol::JsonRpcMessage;

struct Buffered {
    message: JsonRpcMessage,
    received_at: Instant,
}

/// Why `wait_for` came back empty-handed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unanswered {
    TimedOut,
    /// The stream feeding the buffer went away
    Closed,
}

/// Responses keyed by request id, filled by the stream listener and drained
/// by callers.
///
/// Inserting wakes every waiter; each checks for its own id. Entries nobody
/// claims within `retention` are evicted on the next insert or wait.
pub struct PendingResponses {
    entries: Mutex<HashMap<String, Buffered>>,
    notify: Notify,
    retention: Duration,
    closed: AtomicBool,
}

impl PendingResponses {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            notify: Notify::new(),
            retention,
            closed: AtomicBool::new(false),
        }
    }

    /// Buffer a response; messages without a usable id are refused.
    ///
    /// A later response with the same id replaces an unclaimed earlier one.
    pub fn push(&self, message: JsonRpcMessage) -> bool {
        let Some(key) = message.id_key() else {
            return false;
        };

        {
            let mut entries = self.entries.lock();
            Self::evict(&mut entries, self.retention);
            entries.insert(
                key,
                Buffered {
                    message,
                    received_at: Instant::now(),
                },
            );
        }
        self.notify.notify_waiters();
        true
    }

    /// Remove and return the response for `id`
    pub fn take(&self, id: &str) -> Option<JsonRpcMessage> {
        self.entries.lock().remove(id).map(|b| b.message)
    }

    /// Wait up to `timeout` for the response to `id`, consuming it.
    ///
    /// A timeout too large to express as a deadline waits without one.
    /// Returns early with [`Unanswered::Closed`] once the buffer is closed.
    pub async fn wait_for(
        &self,
        id: &str,
        timeout: Duration,
    ) -> Result<JsonRpcMessage, Unanswered> {
        let deadline = Instant::now().checked_add(timeout);
        self.evict_stale();

        loop {
            // Register before checking so an insert between the check and
            // the await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(message) = self.take(id) {
                return Ok(message);
            }
            if self.is_closed() {
                return Err(Unanswered::Closed);
            }

            match deadline {
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notified).await.is_err() {
                        return self.take(id).ok_or(Unanswered::TimedOut);
                    }
                }
                None => notified.await,
            }
        }
    }

    /// Wake every waiter and make later waits fail until [`reopen`](Self::reopen)
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Empty the buffer and accept waiters again, for a new session
    pub fn reopen(&self) {
        self.clear();
        self.closed.store(false, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Drop entries older than the retention horizon
    pub fn evict_stale(&self) -> usize {
        Self::evict(&mut self.entries.lock(), self.retention)
    }

    fn evict(entries: &mut HashMap<String, Buffered>, retention: Duration) -> usize {
        let before = entries.len();
        entries.retain(|_, b| b.received_at.elapsed() < retention);
        let evicted = before - entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted unclaimed responses");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything, used when the session ends
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
