//! Session storage backends
//!
//! The coordinator is the only writer and commits a whole turn at once, so a
//! store only needs idempotent creation, snapshot reads and an atomic
//! [`SessionStore::commit`]. Sessions are never expired here; `delete` and
//! `list_keys` exist for an external retention policy.

use super::{Session, SessionKey, TurnCommit};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Session store trait for abstracting storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create the session if absent and return its current state
    async fn create(&self, key: &SessionKey) -> Result<Session>;

    /// Get a session by key
    async fn get(&self, key: &SessionKey) -> Result<Option<Session>>;

    /// Atomically apply a turn's writes; returns the new turn count
    async fn commit(&self, key: &SessionKey, commit: TurnCommit) -> Result<usize>;

    /// Delete a session
    async fn delete(&self, key: &SessionKey) -> Result<bool>;

    /// List all session keys
    async fn list_keys(&self) -> Result<Vec<SessionKey>>;

    /// Get session count
    async fn count(&self) -> Result<usize>;
}

/// In-memory session store
///
/// Data is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<SessionKey, Session>>>,
}

impl MemoryStore {
    /// Create a new memory store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, key: &SessionKey) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(key.clone()).or_insert_with(|| {
            debug!(session = %key, "Creating session");
            Session::new(key.clone())
        });
        Ok(session.clone())
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(key).cloned())
    }

    async fn commit(&self, key: &SessionKey, commit: TurnCommit) -> Result<usize> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| Error::Session(format!("session {} does not exist", key)))?;
        session.apply(commit);
        debug!(session = %key, turns = session.turns.len(), "Committed turn");
        Ok(session.turns.len())
    }

    async fn delete(&self, key: &SessionKey) -> Result<bool> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.remove(key).is_some())
    }

    async fn list_keys(&self) -> Result<Vec<SessionKey>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.keys().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        let sessions = self.sessions.read().await;
        Ok(sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Turn;
    use serde_json::json;

    fn key(session: &str) -> SessionKey {
        SessionKey::new("plantworks", "user-1", session)
    }

    #[test]
    fn test_create_is_idempotent() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store.create(&key("a")).await.unwrap();
            store
                .commit(&key("a"), TurnCommit::default().with_turn(Turn::assistant("hi")))
                .await
                .unwrap();

            // A second create must not reset history
            let session = store.create(&key("a")).await.unwrap();
            assert_eq!(session.turns.len(), 1);
            assert_eq!(store.count().await.unwrap(), 1);
        });
    }

    #[test]
    fn test_commit_requires_session() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let err = store
                .commit(&key("missing"), TurnCommit::default())
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Session(_)));
        });
    }

    #[test]
    fn test_commit_merges_scratch() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store.create(&key("a")).await.unwrap();

            let turns = store
                .commit(
                    &key("a"),
                    TurnCommit::default()
                        .with_turn(Turn::user("q", vec![]))
                        .with_turn(Turn::assistant("a"))
                        .with_scratch("last_location", json!("Harrow")),
                )
                .await
                .unwrap();
            assert_eq!(turns, 2);

            let session = store.get(&key("a")).await.unwrap().unwrap();
            assert_eq!(session.scratch["last_location"], "Harrow");
        });
    }

    #[test]
    fn test_sessions_are_isolated() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            store.create(&key("a")).await.unwrap();
            store.create(&key("b")).await.unwrap();
            store
                .commit(&key("a"), TurnCommit::default().with_turn(Turn::assistant("x")))
                .await
                .unwrap();

            assert!(store.get(&key("b")).await.unwrap().unwrap().turns.is_empty());
            assert!(store.delete(&key("a")).await.unwrap());
            assert_eq!(store.list_keys().await.unwrap(), vec![key("b")]);
        });
    }
}
