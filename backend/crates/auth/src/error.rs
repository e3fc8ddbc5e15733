//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.
//!
//! Sign-in rejections (`MissingCredentials`, `InvalidUsernameFormat`,
//! `InvalidCredentials`) carry the exact user-facing message in their
//! `Display` output; the login handler flashes that text back to the form.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password field was blank
    #[error("Please enter username and password.")]
    MissingCredentials,

    /// Username does not match the accepted character set / length
    #[error("Invalid username format.")]
    InvalidUsernameFormat,

    /// Unknown user or wrong password (deliberately indistinguishable)
    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// CSRF token on the login form was missing or stale
    #[error("Security validation failed. Please try again.")]
    CsrfValidationFailed,

    /// Remember-me requested without a configured encryption key
    #[error("Remember-me encryption key is not configured")]
    MissingEncryptionKey,

    /// Username cannot be embedded in a remember token
    #[error("Username cannot be encoded into a remember token")]
    InvalidUsername,

    /// Handler ran without the session layer in front of it
    #[error("Session is not available for this request")]
    SessionUnavailable,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether this error is a user-facing sign-in rejection
    pub fn is_sign_in_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCredentials
                | AuthError::InvalidUsernameFormat
                | AuthError::InvalidCredentials
                | AuthError::CsrfValidationFailed
        )
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingCredentials
            | AuthError::InvalidUsernameFormat
            | AuthError::InvalidUsername => ErrorKind::BadRequest,
            AuthError::InvalidCredentials => ErrorKind::Unauthorized,
            AuthError::CsrfValidationFailed => ErrorKind::Forbidden,
            AuthError::MissingEncryptionKey
            | AuthError::SessionUnavailable
            | AuthError::Database(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        match self.kind() {
            // Never leak driver or serializer details to clients
            ErrorKind::InternalServerError => AppError::internal("Internal server error"),
            kind => AppError::new(kind, self.to_string()),
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::SessionUnavailable => {
                tracing::error!("Session layer missing in front of handler");
            }
            AuthError::MissingEncryptionKey => {
                tracing::warn!("Remember-me requested but APP_KEY is not configured");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::CsrfValidationFailed => {
                tracing::warn!("Login form CSRF validation failed");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<platform::crypto::CryptoError> for AuthError {
    fn from(err: platform::crypto::CryptoError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_rejection_messages() {
        assert_eq!(
            AuthError::MissingCredentials.to_string(),
            "Please enter username and password."
        );
        assert_eq!(
            AuthError::InvalidUsernameFormat.to_string(),
            "Invalid username format."
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid username or password."
        );
        assert!(AuthError::InvalidCredentials.is_sign_in_rejection());
        assert!(!AuthError::MissingEncryptionKey.is_sign_in_rejection());
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let err = AuthError::Internal("connection refused on 10.0.0.3".into());
        let app = err.to_app_error();
        assert_eq!(app.kind(), ErrorKind::InternalServerError);
        assert!(!app.message().contains("10.0.0.3"));
    }

    #[test]
    fn test_response_status() {
        use axum::http::StatusCode;

        assert_eq!(
            AuthError::InvalidCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::CsrfValidationFailed.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::SessionUnavailable.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
