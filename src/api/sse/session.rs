//! Session management for SSE connections

use std::collections::HashMap;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::constants::SESSION_CHANNEL_CAPACITY;

/// One connected event stream
#[derive(Debug, Clone)]
pub struct ClientSession {
    pub session_id: String,
    pub connected_at: i64,
    sender: mpsc::Sender<String>,
}

impl ClientSession {
    /// Channel feeding `message` events into this session's stream
    pub fn sender(&self) -> mpsc::Sender<String> {
        self.sender.clone()
    }
}

/// Session table mapping session ids to their outbound channels.
///
/// A plain lock rather than an async one: sessions are removed from `Drop`
/// when a stream goes away.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, ClientSession>>,
    capacity: usize,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::with_capacity(SESSION_CHANNEL_CAPACITY)
    }

    /// Sessions whose channels buffer `capacity` outbound messages
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Generate a new session ID (32 lowercase hex digits)
    pub fn generate_session_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Normalize a client-supplied session id.
    ///
    /// Returns `None` unless it is a UUID; hyphenated and upper-case forms
    /// map to the same key as the hex form we hand out.
    pub fn parse_session_id(raw: &str) -> Option<String> {
        Uuid::parse_str(raw.trim())
            .ok()
            .map(|id| id.simple().to_string())
    }

    /// Create a new session and the receiving end of its channel
    pub fn create_session(&self) -> (ClientSession, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let session = ClientSession {
            session_id: Self::generate_session_id(),
            connected_at: chrono::Utc::now().timestamp(),
            sender,
        };

        self.sessions
            .write()
            .insert(session.session_id.clone(), session.clone());
        (session, receiver)
    }

    /// Remove a session
    pub fn remove_session(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    /// Drop every session, ending their streams
    pub fn close_all(&self) -> usize {
        let mut sessions = self.sessions.write();
        let count = sessions.len();
        sessions.clear();
        count
    }

    /// Get session by ID
    pub fn get_session(&self, session_id: &str) -> Option<ClientSession> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Get active session count
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
