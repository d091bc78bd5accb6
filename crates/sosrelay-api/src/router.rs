//! Route definitions for the SOS relay HTTP API.
//!
//! REST routes are mounted under `/api`; the WebSocket endpoint lives at
//! `/ws`. The router receives `AppState` and passes it to all handlers via
//! Axum's `State` extractor.

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware, routing::get, routing::post};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the Axum router with all routes and request logging.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.realtime.max_message_size;

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(session_routes())
        .merge(ingress_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Health and counters (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/detailed", get(handlers::health::health_detailed))
        .route("/metrics", get(handlers::metrics::metrics))
}

/// Live session views
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(handlers::sessions::list_sessions))
        .route("/sessions/{id}", get(handlers::sessions::get_session))
}

/// System-of-record events
fn ingress_routes() -> Router<AppState> {
    Router::new().route("/ingress/events", post(handlers::ingress::ingest_event))
}
