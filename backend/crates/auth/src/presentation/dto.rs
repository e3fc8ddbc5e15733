//! API DTOs (Data Transfer Objects)

use serde::Serialize;

use crate::application::csrf::CsrfTokenData;

// ============================================================================
// Gate failures
// ============================================================================

/// 401 body for AJAX requests without an authenticated session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequiredResponse {
    pub success: bool,
    pub error: String,
    /// Where the client should send the user
    pub redirect: String,
}

impl AuthRequiredResponse {
    pub fn new(login_path: &str) -> Self {
        Self {
            success: false,
            error: "Authentication required".to_string(),
            redirect: login_path.to_string(),
        }
    }
}

/// 403 body for AJAX requests that fail CSRF validation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfFailureResponse {
    pub success: bool,
    pub error: String,
    pub errors: CsrfFailureDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct CsrfFailureDetail {
    pub csrf: String,
}

impl Default for CsrfFailureResponse {
    fn default() -> Self {
        Self {
            success: false,
            error: "CSRF token validation failed".to_string(),
            errors: CsrfFailureDetail {
                csrf: "Security validation failed. Please refresh the page and try again."
                    .to_string(),
            },
        }
    }
}

/// 401 body from the API-key gate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl Default for ApiKeyErrorResponse {
    fn default() -> Self {
        Self {
            success: false,
            error: "Invalid or missing API key".to_string(),
            message: "Please provide a valid API key via X-API-Key header".to_string(),
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// GET /login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPageResponse {
    /// Error flashed by the previous submission
    pub error: Option<String>,
    pub csrf: CsrfTokenData,
    /// Ready-made hidden input for server-rendered forms
    pub csrf_field: String,
}

/// GET /
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub success: bool,
    pub username: String,
    pub csrf: CsrfTokenData,
}

/// POST /ajax/ping
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResponse {
    pub success: bool,
    pub username: String,
    /// Token to use for the next state-changing call
    pub csrf: CsrfTokenData,
}

/// GET /api
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIndexResponse {
    pub success: bool,
    pub name: String,
    pub version: String,
}
