//! In-Memory Session Store
//!
//! Process-local backend for single-instance deployments and tests.
//! Sessions are lost on restart. Storing a new session ID sweeps expired
//! records, so the map stays bounded by the number of live sessions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::entity::session::{SessionId, SessionRecord};
use crate::domain::repository::SessionStore;
use crate::error::AuthResult;

/// Shared-map session store; clones share the same map
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Whether a live record exists for `id`
    pub async fn contains(&self, id: &SessionId) -> bool {
        self.sessions
            .read()
            .await
            .get(id)
            .is_some_and(|record| !record.is_expired())
    }
}

impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|record| !record.is_expired())
            .cloned())
    }

    async fn save(&self, record: &SessionRecord) -> AuthResult<()> {
        let mut sessions = self.sessions.write().await;

        if !sessions.contains_key(&record.id) {
            let now = Utc::now().timestamp();
            sessions.retain(|_, existing| !existing.is_expired_at(now));
        }

        sessions.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> AuthResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = Utc::now().timestamp();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        let deleted = (before - sessions.len()) as u64;

        tracing::debug!(sessions_deleted = deleted, "Cleaned up expired in-memory sessions");

        Ok(deleted)
    }
}
