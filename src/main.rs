//! Research Portal API
//!
//! Administrative backend for the university research portal: CRUD over
//! faculty, publications, patents, intellectual property, funded projects,
//! consultancy, student projects, awards, teaching materials, and research
//! centers/labs, plus analytics and dashboard aggregations. JWT auth with
//! role-based access control throughout.

mod auth;
mod config;
mod db;
mod error;
mod models;
mod routes;
mod state;
mod status;
mod upload;

use crate::config::Settings;
use crate::routes::create_router;
use crate::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting Research Portal API...");

    // Load configuration; this fails fast when JWT_SECRET is unset.
    let settings = Settings::load()?;
    info!("Configuration loaded");

    // Initialize database pool - required, no in-memory fallback
    let pool = db::create_pool(&settings.database).await?;

    // Create tables if they don't exist
    db::schema::create_tables(&pool).await?;

    let state = Arc::new(AppState::new(pool, &settings));

    // Build the router
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    info!("🌐 Server listening on http://{}", addr);
    info!("   Health check: http://{}/health", addr);
    info!("   API base URL: http://{}/api", addr);

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,research_portal_api=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
