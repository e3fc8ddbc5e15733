//! Session-auth gate

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use platform::client::expects_json;
use platform::crypto::constant_time_eq;

use crate::application::config::AuthConfig;
use crate::application::remember::RememberMe;
use crate::application::session::Session;
use crate::error::AuthError;
use crate::presentation::dto::AuthRequiredResponse;
use crate::presentation::middleware::{AuthenticatedUser, append_set_cookie, redirect_found};

/// Middleware state
#[derive(Clone)]
pub struct AuthGateState {
    pub config: Arc<AuthConfig>,
    pub remember: Arc<RememberMe>,
}

/// Middleware that requires an authenticated session.
///
/// A valid remember-me cookie for the configured user upgrades an
/// anonymous session in place (with ID rotation). Anything else is turned
/// away: 401 JSON for AJAX callers, 302 to the login page for browsers.
pub async fn require_auth(
    State(state): State<AuthGateState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(session) = req.extensions().get::<Session>().cloned() else {
        return Err(AuthError::SessionUnavailable.into_response());
    };

    if session.is_authenticated() {
        let username = session.username().unwrap_or_default();
        req.extensions_mut().insert(AuthenticatedUser { username });
        return Ok(next.run(req).await);
    }

    let had_remember_cookie = state.remember.has_remember_token(req.headers());

    if had_remember_cookie {
        if let Some(username) = restore_from_remember(&state, &session, req.headers()) {
            req.extensions_mut().insert(AuthenticatedUser { username });
            return Ok(next.run(req).await);
        }
    }

    tracing::debug!(path = %req.uri().path(), "Unauthenticated request");

    let mut response = if expects_json(req.headers()) {
        (
            StatusCode::UNAUTHORIZED,
            Json(AuthRequiredResponse::new(&state.config.login_path)),
        )
            .into_response()
    } else {
        redirect_found(&state.config.login_path)
    };

    if had_remember_cookie {
        append_set_cookie(&mut response, &state.remember.clear_remember_token());
    }

    Err(response)
}

fn restore_from_remember(
    state: &AuthGateState,
    session: &Session,
    headers: &HeaderMap,
) -> Option<String> {
    let credentials = &state.config.credentials;

    let Some(password_hash) = credentials.password_hash.as_ref() else {
        tracing::warn!("Remember-me cookie presented but no password hash is configured");
        return None;
    };

    let Some(username) = state
        .remember
        .validate_remember_token(headers, password_hash.as_phc_string())
    else {
        tracing::warn!("Invalid remember-me cookie rejected");
        return None;
    };

    if !constant_time_eq(username.as_bytes(), credentials.username.as_bytes()) {
        tracing::warn!("Remember-me cookie for an unexpected user rejected");
        return None;
    }

    session.regenerate(true);
    session.authenticate(&username);

    tracing::info!(username = %username, "Session restored from remember-me cookie");

    Some(username)
}
