//! Auth Router

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{any, get, post},
};

use crate::application::config::AuthConfig;
use crate::application::remember::RememberMe;
use crate::application::session::SessionManager;
use crate::domain::repository::SessionStore;
use crate::infra::postgres::PgSessionStore;
use crate::presentation::handlers::{self, WebAppState};
use crate::presentation::middleware::{
    ApiKeyGateState, AuthGateState, CsrfGateState, SessionLayerState, require_api_key,
    require_auth, session_layer, verify_csrf,
};

/// Create the router with the PostgreSQL session store
pub fn auth_router(store: PgSessionStore, config: AuthConfig) -> Router {
    auth_router_generic(store, config)
}

/// Create the router for any session store implementation.
///
/// Web routes (`/login`, `/logout`, `/`, `/ajax/*`) share one session
/// layer; `/api/*` is stateless and guarded by API key only.
pub fn auth_router_generic<S>(store: S, config: AuthConfig) -> Router
where
    S: SessionStore + Clone + Send + Sync + 'static,
{
    let config = Arc::new(config);
    let csrf_config = Arc::new(config.csrf.clone());
    let remember = Arc::new(RememberMe::new(&config.remember));

    let session_state = SessionLayerState {
        manager: Arc::new(SessionManager::new(
            Arc::new(store),
            Arc::new(config.session.clone()),
        )),
    };
    let auth_state = AuthGateState {
        config: config.clone(),
        remember: remember.clone(),
    };
    let csrf_state = CsrfGateState {
        config: csrf_config.clone(),
    };
    let api_state = ApiKeyGateState {
        config: Arc::new(config.api.clone()),
    };
    let web_state = WebAppState {
        config,
        csrf: csrf_config,
        remember,
    };

    let ajax = Router::new()
        .route("/ping", post(handlers::ping))
        .route("/csrf", get(handlers::csrf_token))
        .route_layer(from_fn_with_state(csrf_state, verify_csrf));

    let protected = Router::new()
        .route("/", get(handlers::home))
        .route("/logout", get(handlers::logout))
        .nest("/ajax", ajax)
        .route_layer(from_fn_with_state(auth_state, require_auth));

    let web = Router::new()
        .route(
            "/login",
            get(handlers::login_page).post(handlers::login_submit),
        )
        .merge(protected)
        .with_state(web_state)
        .layer(from_fn_with_state(session_state, session_layer::<S>));

    let api = Router::new()
        .route("/", get(handlers::api_index))
        .route("/{*path}", any(handlers::api_not_found))
        .layer(from_fn_with_state(api_state, require_api_key));

    Router::new().merge(web).nest("/api", api)
}
