//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use inkboard_realtime::RealtimeState;
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Live rooms
    pub rooms: usize,
    /// Open real-time sessions
    pub sessions: usize,
}

async fn health_check(State(state): State<Arc<RealtimeState>>) -> Json<HealthResponse> {
    let status = if state.rooms.is_accepting() {
        "healthy"
    } else {
        "draining"
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        rooms: state.rooms.room_count(),
        sessions: state.sessions.len(),
    })
}

/// Create health routes
pub fn health_routes(state: Arc<RealtimeState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
}
