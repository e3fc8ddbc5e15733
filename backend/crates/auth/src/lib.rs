//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Session entities, CSRF token, storage trait
//! - `application/` - Session manager, CSRF guard, remember-me codec, use cases
//! - `infra/` - In-memory and PostgreSQL session stores
//! - `presentation/` - Middleware gates, HTTP handlers, DTOs, router
//!
//! ## Features
//! - Server-side sessions with strict ID handling and periodic ID rotation
//! - Synchronizer-token CSRF protection for state-changing requests
//! - Stateless remember-me cookies (AES-256-CTR + HMAC-SHA256)
//! - Static API keys with permissive CORS for the REST surface
//!
//! ## Security Model
//! - Sessions bound to client fingerprint (User-Agent)
//! - Session ID rotated on login and at least every 30 minutes
//! - Remember tokens bound to the stored password hash
//! - Password verified with Argon2id; unknown users cost the same as known ones

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{memory::MemorySessionStore, postgres::PgSessionStore};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::application::csrf::CsrfTokenData;
    pub use crate::domain::entity::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::domain::repository::SessionStore;
    pub use crate::infra::memory::MemorySessionStore;
    pub use crate::infra::postgres::PgSessionStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
