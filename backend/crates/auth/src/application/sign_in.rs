//! Sign In Use Case
//!
//! Authenticates the configured account and upgrades the session.

use std::sync::Arc;

use platform::crypto::constant_time_eq;
use platform::password::{ClearTextPassword, HashedPassword};

use crate::application::config::AuthConfig;
use crate::application::remember::RememberMe;
use crate::application::session::Session;
use crate::error::{AuthError, AuthResult};

const USERNAME_MIN_LEN: usize = 6;
const USERNAME_MAX_LEN: usize = 20;

/// Sign in input
pub struct SignInInput {
    pub username: String,
    pub password: String,
    /// Remember me flag
    pub remember: bool,
}

/// Sign in output
#[derive(Debug)]
pub struct SignInOutput {
    pub username: String,
    /// `Set-Cookie` value for the remember cookie, when one was issued
    pub remember_cookie: Option<String>,
}

/// ASCII letters and digits, 6 to 20 characters
pub fn is_valid_username(username: &str) -> bool {
    (USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&username.len())
        && username.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Sign in use case
pub struct SignInUseCase {
    config: Arc<AuthConfig>,
    remember: Arc<RememberMe>,
}

impl SignInUseCase {
    pub fn new(config: Arc<AuthConfig>, remember: Arc<RememberMe>) -> Self {
        Self { config, remember }
    }

    pub async fn execute(&self, session: &Session, input: SignInInput) -> AuthResult<SignInOutput> {
        let username = input.username.trim();

        if username.is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        if !is_valid_username(username) {
            return Err(AuthError::InvalidUsernameFormat);
        }

        let password =
            ClearTextPassword::new(input.password).map_err(|_| AuthError::InvalidCredentials)?;

        let credentials = &self.config.credentials;
        let known_user = constant_time_eq(username.as_bytes(), credentials.username.as_bytes());
        let stored_hash = credentials.password_hash.clone().filter(|_| known_user);

        // Unknown users still pay for one Argon2 verification
        let target = stored_hash.clone().unwrap_or_else(HashedPassword::dummy);
        let verified = tokio::task::spawn_blocking(move || target.verify(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))?;

        let Some(stored_hash) = stored_hash.filter(|_| verified) else {
            return Err(AuthError::InvalidCredentials);
        };

        session.regenerate(true);
        session.authenticate(username);

        let remember_cookie = if input.remember {
            match self
                .remember
                .create_remember_token(username, stored_hash.as_phc_string())
            {
                Ok(cookie) => Some(cookie),
                Err(e) => {
                    tracing::warn!(error = %e, "Remember-me cookie not issued");
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            username = %username,
            remember_me = remember_cookie.is_some(),
            "User signed in"
        );

        Ok(SignInOutput {
            username: username.to_string(),
            remember_cookie,
        })
    }
}
