//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::WebAppState;
pub use middleware::{
    ApiKeyGateState, AuthGateState, AuthenticatedUser, CsrfGateState, SessionLayerState,
    require_api_key, require_auth, session_layer, verify_csrf,
};
pub use router::{auth_router, auth_router_generic};
