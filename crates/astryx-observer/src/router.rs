//! Axum router construction for the gateway.
//!
//! Assembles all routes (ingest, pull, and `WebSocket`) into a single
//! [`Router`] with CORS enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::guard;
use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `POST /ingest` -- snapshot ingestion
/// - `GET /summary` -- aggregate statistics
/// - `GET /ws/snapshots` -- `WebSocket` live snapshot stream
/// - `GET /api/history` -- ordered history
/// - `GET /api/latest` -- latest snapshot
/// - `GET /api/status` -- service status
/// - `GET /api/guard/latest`, `POST /api/guard` -- trait guard reports
///
/// CORS allows any origin; the gateway carries no credentials.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // Producer and analytics boundary
        .route("/ingest", post(handlers::ingest))
        .route("/summary", get(handlers::summary))
        // WebSocket
        .route("/ws/snapshots", get(ws::ws_snapshots))
        // Dashboard pull API
        .route("/api/history", get(handlers::history))
        .route("/api/latest", get(handlers::latest))
        .route("/api/status", get(handlers::status))
        .route("/api/guard", post(guard::guard_check))
        .route("/api/guard/latest", get(guard::guard_latest))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
