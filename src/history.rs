//! Per-session chat history.
//!
//! Sessions are identified by an opaque, client-supplied id and live in
//! process memory for the lifetime of the process. The store exclusively owns
//! all turns; callers read snapshots and append through this interface only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message within a session, immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// In-memory store mapping session ids to ordered turn logs.
///
/// A single `RwLock` serializes mutation; it is never held across an await
/// point, so concurrent requests only contend for the microseconds of an
/// append or snapshot.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Vec<Turn>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Return a snapshot of the session's history, creating an empty session
    /// if it does not exist yet.
    pub fn get_or_create(&self, session_id: &str) -> Vec<Turn> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.entry(session_id.to_string()).or_default().clone()
    }

    /// Append a user/assistant turn pair under one lock acquisition.
    ///
    /// Appending both turns together keeps the pair atomic: a racing request
    /// on the same session can interleave between pairs but never inside one.
    pub fn append_exchange(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let mut sessions = self.sessions.write().unwrap();
        let turns = sessions.entry(session_id.to_string()).or_default();
        turns.push(Turn::new(Role::User, user_text));
        turns.push(Turn::new(Role::Assistant, assistant_text));
    }

    /// Remove a session's history entirely. Returns whether anything existed.
    /// Clearing an absent session is a no-op success.
    pub fn clear(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(session_id).is_some()
    }

    /// Number of turns recorded for a session (0 for unknown sessions).
    pub fn len(&self, session_id: &str) -> usize {
        let sessions = self.sessions.read().unwrap();
        sessions.get(session_id).map_or(0, |t| t.len())
    }

    /// Whether a session has no recorded turns.
    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    /// Number of known sessions.
    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.read().unwrap();
        sessions.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
