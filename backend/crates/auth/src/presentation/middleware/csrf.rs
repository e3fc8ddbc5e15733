//! CSRF enforcement gate

use std::sync::Arc;

use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, Method, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use serde_json::Value;

use platform::client::expects_json;

use crate::application::config::CsrfConfig;
use crate::application::csrf::CsrfGuard;
use crate::application::session::Session;
use crate::error::AuthError;
use crate::presentation::dto::CsrfFailureResponse;
use crate::presentation::middleware::query_param;

/// Header used by script-driven clients
pub const CSRF_HEADER: HeaderName = HeaderName::from_static("x-csrf-token");

/// Largest body buffered while looking for a token
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Middleware state
#[derive(Clone)]
pub struct CsrfGateState {
    pub config: Arc<CsrfConfig>,
}

/// Reject state-changing requests that do not carry the session's CSRF
/// token. Every request that passes gets the current `CsrfTokenData` in its
/// extensions.
pub async fn verify_csrf(
    State(state): State<CsrfGateState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let Some(session) = req.extensions().get::<Session>().cloned() else {
        return Err(AuthError::SessionUnavailable.into_response());
    };

    let guard = CsrfGuard::new(session, state.config.clone());

    let mut req = if is_state_changing(req.method()) {
        let (parts, body) = req.into_parts();
        let token_name = guard.token_name();

        let (candidate, body) = match header_token(&parts.headers, token_name) {
            Some(token) => (Some(token), body),
            None => {
                let bytes = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
                    tracing::warn!(error = %e, "Request body rejected during CSRF check");
                    AppError::new(ErrorKind::PayloadTooLarge, "Request body too large")
                        .into_response()
                })?;
                let token = body_token(&parts.headers, &bytes, token_name)
                    .or_else(|| query_param(&parts.uri, token_name));
                (token, Body::from(bytes))
            }
        };

        if !guard.validate_token(candidate.as_deref()) {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                token_present = candidate.is_some(),
                "CSRF token validation failed"
            );
            return Err(failure_response(&parts.headers));
        }

        if state.config.rotate_on_validate {
            guard.regenerate_token();
        }

        Request::from_parts(parts, body)
    } else {
        req
    };

    req.extensions_mut().insert(guard.token_data());

    Ok(next.run(req).await)
}

fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}

fn header_token(headers: &HeaderMap, token_name: &str) -> Option<String> {
    let read = |name: &HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    read(&CSRF_HEADER).or_else(|| {
        HeaderName::from_bytes(token_name.as_bytes())
            .ok()
            .and_then(|name| read(&name))
    })
}

fn body_token(headers: &HeaderMap, body: &[u8], token_name: &str) -> Option<String> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/x-www-form-urlencoded" => url::form_urlencoded::parse(body)
            .find(|(key, _)| key == token_name)
            .map(|(_, value)| value.into_owned()),
        "application/json" => match serde_json::from_slice::<Value>(body).ok()?.get(token_name)? {
            Value::String(token) => Some(token.clone()),
            _ => None,
        },
        _ => None,
    }
}

fn failure_response(headers: &HeaderMap) -> Response {
    if expects_json(headers) {
        (StatusCode::FORBIDDEN, Json(CsrfFailureResponse::default())).into_response()
    } else {
        (
            StatusCode::FORBIDDEN,
            "CSRF token validation failed. Please go back and try again.",
        )
            .into_response()
    }
}
