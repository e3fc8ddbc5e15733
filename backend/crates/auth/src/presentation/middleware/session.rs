//! Session activation

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;

use platform::client::extract_fingerprint;
use platform::cookie::extract_cookie;

use crate::application::session::{Session, SessionManager};
use crate::domain::repository::SessionStore;
use crate::error::AuthError;
use crate::presentation::middleware::append_set_cookie;

/// Middleware state
#[derive(Clone)]
pub struct SessionLayerState<S>
where
    S: SessionStore + Clone + Send + Sync + 'static,
{
    pub manager: Arc<SessionManager<S>>,
}

/// Start the session before the inner service and commit it afterwards.
///
/// Idempotent: a request that already carries a `Session` passes through.
pub async fn session_layer<S>(
    State(state): State<SessionLayerState<S>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    S: SessionStore + Clone + Send + Sync + 'static,
{
    if req.extensions().get::<Session>().is_some() {
        return next.run(req).await;
    }

    let fingerprint = extract_fingerprint(req.headers());
    let cookie = extract_cookie(req.headers(), &state.manager.config().cookie_name);

    let session = state.manager.start(cookie.as_deref(), &fingerprint).await;
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    if let Some(set_cookie) = state.manager.commit(&session).await {
        append_set_cookie(&mut response, &set_cookie);
    }

    response
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthError::SessionUnavailable)
    }
}
