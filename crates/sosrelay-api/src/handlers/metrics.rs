//! Hub counters.

use axum::Json;
use axum::extract::State;

use sosrelay_realtime::server::EngineStats;

use crate::dto::response::ApiResponse;
use crate::state::AppState;

/// GET /api/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<ApiResponse<EngineStats>> {
    Json(ApiResponse::ok(state.realtime.stats()))
}
