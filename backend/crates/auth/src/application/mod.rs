//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod csrf;
pub mod remember;
pub mod session;
pub mod sign_in;
pub mod sign_out;

// Re-exports
pub use config::AuthConfig;
pub use csrf::{CsrfGuard, CsrfTokenData};
pub use remember::{RememberCodec, RememberMe};
pub use session::{Session, SessionManager};
pub use sign_in::{SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;

/// Re-export ClientFingerprint from platform
pub use platform::client::ClientFingerprint;
