//! HTTP Handlers

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Form, State};
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;

use crate::application::config::{AuthConfig, CsrfConfig};
use crate::application::csrf::{CsrfGuard, CsrfTokenData};
use crate::application::remember::RememberMe;
use crate::application::session::Session;
use crate::application::{SignInInput, SignInUseCase, SignOutUseCase};
use crate::error::AuthError;
use crate::presentation::dto::{ApiIndexResponse, HomeResponse, LoginPageResponse, PingResponse};
use crate::presentation::middleware::{AuthenticatedUser, append_set_cookie, redirect_found};

/// Session key for the login error flash
const ERROR_FLASH: &str = "error";

/// Shared state for web handlers
#[derive(Clone)]
pub struct WebAppState {
    pub config: Arc<AuthConfig>,
    pub csrf: Arc<CsrfConfig>,
    pub remember: Arc<RememberMe>,
}

impl WebAppState {
    fn csrf(&self, session: &Session) -> CsrfGuard {
        CsrfGuard::new(session.clone(), self.csrf.clone())
    }
}

// ============================================================================
// Login
// ============================================================================

/// GET /login
pub async fn login_page(State(state): State<WebAppState>, session: Session) -> Response {
    if session.is_authenticated() {
        return redirect_found(&state.config.home_path);
    }

    let error = session
        .get_flash(ERROR_FLASH)
        .and_then(|value| value.as_str().map(str::to_string));

    let guard = state.csrf(&session);

    Json(LoginPageResponse {
        error,
        csrf: guard.token_data(),
        csrf_field: guard.token_field(),
    })
    .into_response()
}

/// POST /login
pub async fn login_submit(
    State(state): State<WebAppState>,
    session: Session,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let guard = state.csrf(&session);

    if !guard.validate_token(form.get(guard.token_name()).map(String::as_str)) {
        return reject_login(&state, &session, AuthError::CsrfValidationFailed);
    }

    let input = SignInInput {
        username: form.get("username").cloned().unwrap_or_default(),
        password: form.get("password").cloned().unwrap_or_default(),
        remember: form.contains_key("remember"),
    };

    let use_case = SignInUseCase::new(state.config.clone(), state.remember.clone());

    match use_case.execute(&session, input).await {
        Ok(output) => {
            let mut response = redirect_found(&state.config.home_path);
            if let Some(cookie) = output.remember_cookie {
                append_set_cookie(&mut response, &cookie);
            }
            response
        }
        Err(e) if e.is_sign_in_rejection() => reject_login(&state, &session, e),
        Err(e) => e.into_response(),
    }
}

fn reject_login(state: &WebAppState, session: &Session, error: AuthError) -> Response {
    error.log();
    session.flash(ERROR_FLASH, error.to_string());
    redirect_found(&state.config.login_path)
}

/// GET /logout
pub async fn logout(State(state): State<WebAppState>, session: Session) -> Response {
    let use_case = SignOutUseCase::new(state.remember.clone());
    let clear_cookie = use_case.execute(&session);

    let mut response = redirect_found(&state.config.login_path);
    append_set_cookie(&mut response, &clear_cookie);
    response
}

// ============================================================================
// Protected pages
// ============================================================================

/// GET /
pub async fn home(
    State(state): State<WebAppState>,
    session: Session,
    Extension(user): Extension<AuthenticatedUser>,
) -> Json<HomeResponse> {
    Json(HomeResponse {
        success: true,
        username: user.username,
        csrf: state.csrf(&session).token_data(),
    })
}

/// POST /ajax/ping
pub async fn ping(
    Extension(user): Extension<AuthenticatedUser>,
    Extension(csrf): Extension<CsrfTokenData>,
) -> Json<PingResponse> {
    Json(PingResponse {
        success: true,
        username: user.username,
        csrf,
    })
}

/// GET /ajax/csrf
pub async fn csrf_token(Extension(csrf): Extension<CsrfTokenData>) -> Json<CsrfTokenData> {
    Json(csrf)
}

// ============================================================================
// API
// ============================================================================

/// GET /api
pub async fn api_index() -> Json<ApiIndexResponse> {
    Json(ApiIndexResponse {
        success: true,
        name: "inventory-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Any other path under /api
pub async fn api_not_found() -> AppError {
    AppError::not_found("API endpoint not found")
}
