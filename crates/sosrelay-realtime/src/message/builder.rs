//! Builder helpers for constructing outbound messages.

use chrono::Utc;

use sosrelay_core::error::AppError;
use sosrelay_core::types::ConnectionId;

use crate::history::LocationEvent;
use crate::room::RoomKey;

use super::types::OutboundMessage;

/// Build the greeting sent on connect
pub fn build_connection_established(connection_id: ConnectionId) -> OutboundMessage {
    OutboundMessage::ConnectionEstablished {
        connection_id,
        message: "Connected to SOS relay".to_string(),
    }
}

/// Build a room join acknowledgment
pub fn build_room_joined(room: &RoomKey) -> OutboundMessage {
    let message = match room {
        RoomKey::Incident(id) => format!("Joined SOS room {id}"),
        RoomKey::Unit(unit) => format!("Joined unit room {unit}"),
        RoomKey::IncidentChannel => "Joined SOS channel".to_string(),
        RoomKey::TrackingChannel => "Joined location tracking channel".to_string(),
    };
    OutboundMessage::RoomJoined {
        room: room.to_room_name(),
        message,
    }
}

/// Build the catch-up replay sent after joining an incident room
pub fn build_replay(room_id: &str, updates: Vec<LocationEvent>) -> OutboundMessage {
    OutboundMessage::LocationHistory {
        room_id: room_id.to_string(),
        replay: true,
        updates,
    }
}

/// Build a live location update for an incident room
pub fn build_live_location(room_id: &str, event: LocationEvent) -> OutboundMessage {
    OutboundMessage::LocationHistory {
        room_id: room_id.to_string(),
        replay: false,
        updates: vec![event],
    }
}

/// Build a heartbeat ping
pub fn build_ping() -> OutboundMessage {
    OutboundMessage::Ping {
        timestamp: Utc::now(),
    }
}

/// Build an error message
pub fn build_error(error: &AppError) -> OutboundMessage {
    OutboundMessage::Error {
        code: error.kind.to_string(),
        message: error.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_joined_names_room() {
        match build_room_joined(&RoomKey::Incident("9".to_string())) {
            OutboundMessage::RoomJoined { room, message } => {
                assert_eq!(room, "sos_9");
                assert_eq!(message, "Joined SOS room 9");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_error_carries_kind_code() {
        match build_error(&AppError::validation("Room ID is required")) {
            OutboundMessage::Error { code, message } => {
                assert_eq!(code, "VALIDATION");
                assert_eq!(message, "Room ID is required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
