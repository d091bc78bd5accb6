//! System-of-record event ingress.
//!
//! The body is read as raw bytes so malformed JSON is reported in the
//! same `{success, error, message}` shape as every other rejection.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde_json::Value;

use sosrelay_core::error::AppError;
use sosrelay_realtime::bridge::event_bridge::IngressReceipt;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/ingress/events
pub async fn ingest_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<IngressReceipt>>, ApiError> {
    let raw: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::validation(format!("Invalid JSON body: {e}")))?;

    let receipt = state.realtime.ingest_value(raw).await?;
    Ok(Json(ApiResponse::ok(receipt)))
}
