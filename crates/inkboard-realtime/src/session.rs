//! Session Registry
//!
//! Tracks every live connection and the queue its outbound messages go
//! through. Sending never waits on the receiving connection.

use dashmap::DashMap;
use inkboard_core::{ServerMessage, SessionId, UserId};
use tokio::sync::mpsc;
use tracing::debug;

struct SessionEntry {
    user_id: Option<UserId>,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

/// Registry of live sessions
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionEntry>,
}

impl SessionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a session and return the receiving end of its outbound queue
    pub fn register(&self, session_id: SessionId) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions
            .insert(session_id, SessionEntry { user_id: None, tx });
        debug!(session_id = %session_id, "Session registered");
        rx
    }

    /// Record the user a session authenticated as
    pub fn bind_user(&self, session_id: SessionId, user_id: &str) {
        if let Some(mut entry) = self.sessions.get_mut(&session_id) {
            entry.user_id = Some(user_id.to_string());
        }
    }

    /// User a session authenticated as, if any
    #[must_use]
    pub fn user_of(&self, session_id: SessionId) -> Option<UserId> {
        self.sessions
            .get(&session_id)
            .and_then(|entry| entry.user_id.clone())
    }

    /// Remove a session
    pub fn unregister(&self, session_id: SessionId) {
        self.sessions.remove(&session_id);
        debug!(session_id = %session_id, "Session unregistered");
    }

    /// Queue a message for a session; returns false if the session is gone
    pub fn send(&self, session_id: SessionId, message: ServerMessage) -> bool {
        match self.sessions.get(&session_id) {
            Some(entry) => entry.tx.send(message).is_ok(),
            None => false,
        }
    }

    /// Number of live sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are live
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_send_to_registered_session() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        let mut rx = registry.register(id);

        assert!(registry.send(id, ServerMessage::Pong));
        assert_eq!(rx.try_recv().unwrap(), ServerMessage::Pong);
    }

    #[test]
    fn test_send_to_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(!registry.send(Uuid::new_v4(), ServerMessage::Pong));
    }

    #[test]
    fn test_unregister() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        let _rx = registry.register(id);
        registry.bind_user(id, "alice");
        assert_eq!(registry.user_of(id), Some("alice".to_string()));

        registry.unregister(id);
        assert!(registry.is_empty());
        assert!(!registry.send(id, ServerMessage::Pong));
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        drop(registry.register(id));
        assert!(!registry.send(id, ServerMessage::Pong));
    }
}
