//! Wire framing for everything the hub sends to a client.
//!
//! Every outbound frame is `{id, room, seq, timestamp, data}`. `seq` is
//! assigned by the owning connection and grows by one per queued frame,
//! so a client can spot gaps after a reconnect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::room::RoomKey;

use super::types::OutboundMessage;

/// One framed outbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Random frame id.
    pub id: String,
    /// Room name for broadcasts; `null` for direct replies.
    pub room: Option<String>,
    /// Per-connection sequence number, starting at 1.
    pub seq: u64,
    /// Queue time.
    pub timestamp: DateTime<Utc>,
    /// Tagged payload.
    pub data: OutboundMessage,
}

impl MessageEnvelope {
    /// Frames `data` as the `seq`-th message of a connection.
    pub fn frame(data: OutboundMessage, room: Option<&RoomKey>, seq: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            room: room.map(RoomKey::to_room_name),
            seq,
            timestamp: Utc::now(),
            data,
        }
    }

    /// Wire tag of the payload (`room_joined`, `new_sos`, ...).
    pub fn kind(&self) -> &'static str {
        self.data.type_name()
    }
}
