//! Domain Layer
//!
//! Contains entities and the session storage trait.

pub mod entity;
pub mod repository;

// Re-exports
pub use entity::{CsrfToken, SessionData, SessionId, SessionRecord};
pub use repository::SessionStore;
