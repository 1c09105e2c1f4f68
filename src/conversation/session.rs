//! Conversation sessions and the in-process session store.

use super::history::{condense, trim, Message};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use uuid::Uuid;

/// One user's conversation and its persisted memory.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    history: Vec<Message>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Persisted memory: alternating human/assistant messages.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Forget all prior turns.
    pub fn reset(&mut self) {
        self.history.clear();
        self.updated_at = Utc::now();
    }

    /// Fold a completed turn into memory: condense, then keep the last `max_pairs` pairs.
    pub(crate) fn commit(&mut self, turn: &[Message], max_pairs: usize) {
        let mut combined = self.history.clone();
        combined.extend_from_slice(turn);
        self.history = trim(&condense(&combined), max_pairs);
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to a session. Holding the lock serialises turns within it.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Sessions keyed by id, for servers that host many conversations.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a fresh session.
    pub fn create(&self) -> (Uuid, SessionHandle) {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle.clone());
        (id, handle)
    }

    pub fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
