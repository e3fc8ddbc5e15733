//! Domain Entities

pub mod csrf_token;
pub mod session;

pub use csrf_token::CsrfToken;
pub use session::{SessionData, SessionId, SessionRecord};
