//! Server initialization
//!
//! Connects the canvas store, seeds credentials, wires the realtime core
//! and serves the router until a shutdown signal arrives.

use super::config::{AppConfig, SeedUser};
use crate::api::{canvas_routes, health_routes};
use anyhow::{Context, Result};
use axum::{routing::get, Extension, Router};
use inkboard_core::{CredentialVerifier, SqliteCanvasStore, TokenVerifier, UserDirectory};
use inkboard_realtime::{realtime_ws_handler, RealtimeState};
use sqlx::sqlite::SqlitePoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

/// Connect the store and build the realtime state
pub async fn build_state(config: &AppConfig) -> Result<Arc<RealtimeState>> {
    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections.max(1))
        .connect(&config.database.url)
        .await
        .with_context(|| format!("Failed to connect to database: {}", config.database.url))?;

    let store = Arc::new(SqliteCanvasStore::new(pool));
    store
        .init()
        .await
        .context("Failed to initialize canvas tables")?;
    info!(url = %config.database.url, "Canvas store ready");

    let verifier = Arc::new(TokenVerifier::new());
    seed_users(&config.auth.users, store.as_ref(), &verifier).await?;
    if verifier.is_empty() {
        warn!("No users configured under [auth]; every join will be rejected");
    }

    Ok(Arc::new(RealtimeState::new(
        store,
        verifier,
        config.realtime.settings(),
    )))
}

async fn seed_users(
    users: &[SeedUser],
    directory: &dyn UserDirectory,
    verifier: &TokenVerifier,
) -> Result<()> {
    for user in users {
        directory
            .add_user(&user.id, &user.email)
            .await
            .with_context(|| format!("Failed to register user {}", user.id))?;
        verifier.register(&user.token, user.id.as_str(), user.expires_at);
    }
    info!(count = users.len(), "Seed users registered");
    Ok(())
}

/// Assemble the HTTP and WebSocket routes around the realtime state
pub fn build_router(state: Arc<RealtimeState>) -> Router {
    let verifier: Arc<dyn CredentialVerifier> = Arc::clone(&state.verifier);

    let ws_routes = Router::new()
        .route("/ws", get(realtime_ws_handler))
        .with_state(Arc::clone(&state));

    Router::new()
        .merge(health_routes(Arc::clone(&state)))
        .merge(canvas_routes(Arc::clone(&state.service)))
        .merge(ws_routes)
        .layer(Extension(verifier))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run the server until Ctrl+C or SIGTERM
pub async fn run(config: AppConfig) -> Result<()> {
    info!("Starting Inkboard v{}", env!("CARGO_PKG_VERSION"));

    let state = build_state(&config).await?;
    let app = build_router(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on http://{}", addr);
    info!("WebSocket endpoint at ws://{}/ws", addr);

    // Cancelling the realtime token closes open sockets, which lets the
    // graceful shutdown below complete
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.shutdown.clone()))
        .await
        .context("HTTP server error")?;

    state.shutdown_gracefully().await;
    info!("Inkboard shutdown complete");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, closing connections");
    token.cancel();
}
