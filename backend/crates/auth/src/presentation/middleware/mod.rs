//! HTTP Middleware
//!
//! Web routes run `session_layer` → `require_auth` → `verify_csrf` →
//! handler. API routes run `require_api_key` only and never touch the
//! session.

mod api_key;
mod auth;
mod csrf;
mod session;

pub use api_key::{ApiKeyGateState, require_api_key};
pub use auth::{AuthGateState, require_auth};
pub use csrf::{CSRF_HEADER, CsrfGateState, verify_csrf};
pub use session::{SessionLayerState, session_layer};

use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};

/// Authenticated principal, inserted into request extensions by [`require_auth`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// 302 Found to `location`
pub(crate) fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Append a `Set-Cookie` header without replacing earlier ones
pub(crate) fn append_set_cookie(response: &mut Response, cookie: &str) {
    match platform::cookie::to_header_value(cookie) {
        Some(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        None => tracing::error!("Refusing to emit cookie that is not a valid header value"),
    }
}

/// First value of a query-string parameter
pub(crate) fn query_param(uri: &Uri, name: &str) -> Option<String> {
    url::form_urlencoded::parse(uri.query()?.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
