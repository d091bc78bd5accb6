//! Live session listing.

use axum::Json;
use axum::extract::{Path, State};

use sosrelay_core::error::AppError;
use sosrelay_core::types::ConnectionId;
use sosrelay_realtime::connection::SessionInfo;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<ApiResponse<Vec<SessionInfo>>> {
    Json(ApiResponse::ok(state.realtime.connections.sessions().await))
}

/// GET /api/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionInfo>>, ApiError> {
    let conn_id: ConnectionId = id
        .parse()
        .map_err(|_| AppError::validation(format!("Invalid session id: {id}")))?;

    let info = state
        .realtime
        .connections
        .session_info(&conn_id)
        .await
        .ok_or_else(|| AppError::not_found(format!("Unknown session {conn_id}")))?;
    Ok(Json(ApiResponse::ok(info)))
}
