//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use crate::domain::entity::session::{SessionId, SessionRecord};
use crate::error::AuthResult;

/// Session storage backend
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    /// Load a session; expired records are reported as absent
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>>;

    /// Insert or replace a session
    async fn save(&self, record: &SessionRecord) -> AuthResult<()>;

    /// Delete a session (missing IDs are not an error)
    async fn delete(&self, id: &SessionId) -> AuthResult<()>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> AuthResult<u64>;
}
