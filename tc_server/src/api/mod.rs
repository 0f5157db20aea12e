//! HTTP/WebSocket API for the tournament clock server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower-HTTP**: CORS middleware
//! - **Actor Model**: Tournament state managed by dedicated actor tasks
//!
//! # Modules
//!
//! - [`tournaments`]: Tournament management (create, list, get, actions, delete)
//! - [`websocket`]: Real-time clock updates and operator commands
//!
//! # Endpoints Overview
//!
//! ```text
//! GET    /health                          - Server health status
//! POST   /api/tournaments                 - Create tournament
//! GET    /api/tournaments                 - List tournaments
//! GET    /api/tournaments/{id}            - Get tournament state
//! DELETE /api/tournaments/{id}            - Delete tournament
//! POST   /api/tournaments/{id}/actions    - Apply operator action
//! GET    /ws/{id}?operator=<name>         - WebSocket clock feed
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod tournaments;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tournament_clock::TournamentManager;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned per request; cheap due to the Arc wrapper.
#[derive(Clone)]
pub struct AppState {
    /// Manages tournaments and forwards commands to clock actors
    pub manager: Arc<TournamentManager>,
    /// Expose real error details in responses (development only)
    pub debug_errors: bool,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws/{tournament_id}", get(websocket::websocket_handler))
        .route(
            "/api/tournaments",
            post(tournaments::create_tournament).get(tournaments::list_tournaments),
        )
        .route(
            "/api/tournaments/{tournament_id}",
            get(tournaments::get_tournament).delete(tournaments::delete_tournament),
        )
        .route(
            "/api/tournaments/{tournament_id}/actions",
            post(tournaments::take_action),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Reports the active tournament count; the store is exercised indirectly
/// since every running actor persists through it.
///
/// ```bash
/// curl http://localhost:7070/health
/// # {"status":"healthy","tournaments":{"active_count":2},"timestamp":"2026-08-27T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let active_count = state.manager.active_tournament_count().await;
    crate::metrics::active_tournaments(active_count);

    let response = json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "tournaments": {
            "active_count": active_count
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (StatusCode::OK, Json(response))
}
