//! Application builder: wires router, middleware and state into an Axum app.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;

use sosrelay_core::config::AppConfig;
use sosrelay_core::error::AppError;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the relay until `shutdown` resolves, then closes every session.
pub async fn run_server<F>(config: AppConfig, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::from_config(config)?;
    let engine = state.realtime.clone();
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("SOS relay listening on {}", addr);

    let signalled = Arc::new(Notify::new());
    let notify = signalled.clone();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("Shutdown signal received, closing WebSocket sessions...");
            if let Err(e) = engine.shutdown().await {
                tracing::warn!(error = %e, "Real-time engine shutdown failed");
            }
            notify.notify_one();
        })
        .into_future();
    let mut server = std::pin::pin!(server);

    let result = tokio::select! {
        result = &mut server => result,
        _ = signalled.notified() => match tokio::time::timeout(grace, &mut server).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Graceful shutdown exceeded {}s, exiting", grace.as_secs());
                Ok(())
            }
        },
    };
    result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("SOS relay shut down gracefully");
    Ok(())
}
