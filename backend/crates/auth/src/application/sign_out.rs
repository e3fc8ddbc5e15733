//! Sign Out Use Case
//!
//! Ends the session and forgets the remember-me cookie.

use std::sync::Arc;

use crate::application::remember::RememberMe;
use crate::application::session::Session;

/// Sign out use case
pub struct SignOutUseCase {
    remember: Arc<RememberMe>,
}

impl SignOutUseCase {
    pub fn new(remember: Arc<RememberMe>) -> Self {
        Self { remember }
    }

    /// Destroy the session; returns the `Set-Cookie` that expires the
    /// remember cookie
    pub fn execute(&self, session: &Session) -> String {
        let username = session.username();
        session.destroy();

        tracing::info!(username = ?username, "User signed out");

        self.remember.clear_remember_token()
    }
}
