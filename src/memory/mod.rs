//! Conversation sessions.
//!
//! A session is an opaque id plus the last few question/answer exchanges.
//! History is capped per session; adding past the cap drops the oldest
//! exchanges first. [`InMemorySessionStore`] keeps everything in process
//! memory behind one lock. Anything implementing [`SessionStore`] can
//! replace it.

use crate::types::{Exchange, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use tracing::debug;
use uuid::Uuid;

/// Default number of exchanges remembered per session.
pub const DEFAULT_MAX_HISTORY: usize = 2;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Allocate a fresh session id
    async fn create_session(&self) -> Result<String>;

    /// Ordered exchanges of a session; empty for unknown ids
    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>>;

    /// Append an exchange, creating the session if it does not exist
    async fn add_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()>;

    /// Forget a session. Returns whether it existed.
    async fn clear_session(&self, session_id: &str) -> Result<bool>;

    async fn session_count(&self) -> Result<usize>;

    /// History rendered for the system prompt, `None` when there is none
    async fn format_history(&self, session_id: &str) -> Result<Option<String>> {
        Ok(format_history(&self.history(session_id).await?))
    }
}

/// Renders exchanges as alternating `User:` / `Assistant:` lines.
pub fn format_history(history: &[Exchange]) -> Option<String> {
    if history.is_empty() {
        return None;
    }
    Some(
        history
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.query, e.answer))
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, VecDeque<Exchange>>>,
    max_history: usize,
}

impl InMemorySessionStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history: max_history.max(1),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.sessions.write().insert(id.clone(), VecDeque::new());
        debug!(session_id = %id, "Created session");
        Ok(id)
    }

    async fn history(&self, session_id: &str) -> Result<Vec<Exchange>> {
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn add_exchange(&self, session_id: &str, query: &str, answer: &str) -> Result<()> {
        let mut sessions = self.sessions.write();
        let history = sessions.entry(session_id.to_string()).or_default();

        history.push_back(Exchange::new(query, answer));
        while history.len() > self.max_history {
            history.pop_front();
        }
        Ok(())
    }

    async fn clear_session(&self, session_id: &str) -> Result<bool> {
        Ok(self.sessions.write().remove(session_id).is_some())
    }

    async fn session_count(&self) -> Result<usize> {
        Ok(self.sessions.read().len())
    }
}
