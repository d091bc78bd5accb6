//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use sosrelay_core::AppResult;
use sosrelay_core::config::AppConfig;
use sosrelay_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Builds state around an existing engine.
    pub fn new(config: AppConfig, realtime: RealtimeEngine) -> Self {
        Self {
            config: Arc::new(config),
            realtime: Arc::new(realtime),
            started_at: Instant::now(),
        }
    }

    /// Builds state and a fresh engine from configuration.
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let realtime = RealtimeEngine::new(&config)?;
        Ok(Self::new(config, realtime))
    }
}
