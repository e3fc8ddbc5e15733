//! API Server Entry Point
//!
//! Loads configuration, picks the session store and serves the auth router.
//! Uses `anyhow` for startup errors only; request errors render through
//! `AuthError` / `AppError` inside the router.

mod config;

use std::net::SocketAddr;
use std::time::Duration;

use auth::store::SessionStore;
use auth::{MemorySessionStore, PgSessionStore, auth_router, auth_router_generic};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

/// How often expired sessions are purged
const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventory_api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ServerConfig {
        auth: auth_config,
        database_url,
        bind_addr,
    } = ServerConfig::from_env()?;

    let app = match database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let store = PgSessionStore::new(pool);
            spawn_session_cleanup(store.clone(), SESSION_CLEANUP_INTERVAL);

            auth_router(store, auth_config)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, sessions are kept in memory");
            let store = MemorySessionStore::new();
            spawn_session_cleanup(store.clone(), SESSION_CLEANUP_INTERVAL);

            auth_router_generic(store, auth_config)
        }
    };

    let app = app.layer(TraceLayer::new_for_http());

    tracing::info!("Listening on {}", bind_addr);

    let listener = TcpListener::bind(bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Purge expired sessions now and then every `every`.
///
/// Failures are logged and retried on the next tick; they never stop the server.
fn spawn_session_cleanup<S>(store: S, every: Duration)
where
    S: SessionStore + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);

        loop {
            ticker.tick().await;
            if let Err(e) = store.cleanup_expired().await {
                tracing::warn!(error = %e, "Session cleanup failed, retrying next interval");
            }
        }
    });
}
