//! JSON serialization for WebSocket messages.

use sosrelay_core::error::{AppError, ErrorKind};

use super::envelope::MessageEnvelope;
use super::types::InboundMessage;

/// Serialize an outbound message envelope to JSON
pub fn serialize_envelope(envelope: &MessageEnvelope) -> Result<String, serde_json::Error> {
    serde_json::to_string(envelope)
}

/// Deserialize an inbound message from JSON
pub fn deserialize_inbound(text: &str) -> Result<InboundMessage, AppError> {
    serde_json::from_str(text).map_err(|e| {
        AppError::with_source(
            ErrorKind::Validation,
            format!("Failed to parse message: {e}"),
            e,
        )
    })
}
