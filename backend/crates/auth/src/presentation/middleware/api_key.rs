//! API-key gate with permissive CORS

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::config::ApiKeyConfig;
use crate::presentation::dto::ApiKeyErrorResponse;
use crate::presentation::middleware::query_param;

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");
const API_KEY_PARAM: &str = "api_key";

/// Middleware state
#[derive(Clone)]
pub struct ApiKeyGateState {
    pub config: Arc<ApiKeyConfig>,
}

/// Answer preflights, reject requests without an allow-listed key, and
/// attach CORS headers to every response.
pub async fn require_api_key(
    State(state): State<ApiKeyGateState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if req.method() == Method::OPTIONS {
        return with_cors(StatusCode::NO_CONTENT.into_response());
    }

    let candidate = extract_api_key(req.headers()).or_else(|| query_param(req.uri(), API_KEY_PARAM));

    if !state.config.accepts(candidate.as_deref()) {
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            key_present = candidate.is_some(),
            "API request rejected"
        );
        return with_cors(
            (StatusCode::UNAUTHORIZED, Json(ApiKeyErrorResponse::default())).into_response(),
        );
    }

    with_cors(next.run(req).await)
}

/// `X-API-Key` first, then `Authorization: Bearer`
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    let header_key = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    if let Some(key) = header_key {
        return Some(key.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Fixed headers rather than `tower_http::cors::CorsLayer`: every response, not only preflights, must carry all four.
fn with_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization, X-API-Key"),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_api_key_order() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-bearer"));

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-header"));

        headers.insert(API_KEY_HEADER, HeaderValue::from_static(""));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-bearer"));
    }

    #[test]
    fn test_non_bearer_authorization_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic YWJjOmRlZg=="));
        assert_eq!(extract_api_key(&headers), None);
    }

    #[test]
    fn test_with_cors_sets_all_headers() {
        let response = with_cors(StatusCode::OK.into_response());
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization, X-API-Key"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
    }
}
