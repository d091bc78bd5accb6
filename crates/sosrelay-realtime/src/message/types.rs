//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use sosrelay_core::types::{ConnectionId, IncidentId, UnitNumber};

use crate::bridge::relay::RelayResponse;
use crate::history::LocationEvent;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Join an incident room and receive its history.
    JoinSosRoom {
        /// Incident room id (string or number).
        #[serde(default)]
        room_id: Option<Value>,
    },
    /// Declare the officer role and join the unit's room.
    JoinOfficerRoom {
        /// Unit number (string or number).
        #[serde(default)]
        unit_number: Option<Value>,
    },
    /// Join the global new-incident feed.
    JoinSosChannel {},
    /// Join the global unit location feed.
    #[serde(alias = "join_officer_update")]
    JoinLocationTrackingChannel {},
    /// Leave a room by its wire name.
    LeaveRoom {
        /// Room name, e.g. `sos_42`.
        room: String,
    },
    /// Officer position, forwarded to the tracking channel.
    OfficerLocationUpdate(OfficerLocation),
    /// Create an incident through the system-of-record.
    CreateSos {
        /// Raw request fields, validated by the relay.
        #[serde(flatten)]
        fields: Map<String, Value>,
    },
    /// Record an incident location through the system-of-record.
    UpdateLocation {
        /// Raw request fields, validated by the relay.
        #[serde(flatten)]
        fields: Map<String, Value>,
    },
    /// Push a system-of-record event over the socket.
    Ingress {
        /// Ingress envelope `{kind, payload}`.
        event: Value,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        #[serde(default)]
        timestamp: Option<i64>,
    },
}

/// Position reported by an officer's device.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OfficerLocation {
    /// Latitude in degrees.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude in degrees.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Unit the officer belongs to, as a string or number; falls back to
    /// the declared unit.
    #[serde(default)]
    pub unit_number: Option<Value>,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Sent once, right after the socket is accepted.
    ConnectionEstablished {
        /// The new connection's id.
        connection_id: ConnectionId,
        /// Greeting.
        message: String,
    },
    /// Room join acknowledgment.
    RoomJoined {
        /// Room name.
        room: String,
        /// Human-readable confirmation.
        message: String,
    },
    /// Room leave acknowledgment.
    RoomLeft {
        /// Room name.
        room: String,
    },
    /// A new incident was created.
    NewSos {
        /// Incident id.
        sos_id: IncidentId,
        /// Incident room id.
        room_id: String,
        /// Reporter name.
        name: String,
        /// Incident category code.
        sos_type: i32,
        /// Initial latitude.
        latitude: f64,
        /// Initial longitude.
        longitude: f64,
        /// Creation time.
        created_at: DateTime<Utc>,
    },
    /// Incident locations. `replay` is set on the catch-up sent after a
    /// join; live updates carry a single entry.
    LocationHistory {
        /// Incident room id.
        room_id: String,
        /// Whether this is a join replay.
        replay: bool,
        /// Locations, oldest first.
        updates: Vec<LocationEvent>,
    },
    /// Location of the incident a unit is assigned to.
    UnitLocationUpdate {
        /// Incident id.
        sos_id: IncidentId,
        /// Latitude.
        latitude: f64,
        /// Longitude.
        longitude: f64,
        /// Record time.
        timestamp: DateTime<Utc>,
    },
    /// Unit-tagged incident location for the tracking channel.
    LocationTrackingUpdate {
        /// Assigned unit.
        unit_number: UnitNumber,
        /// Incident id.
        sos_id: IncidentId,
        /// Latitude.
        latitude: f64,
        /// Longitude.
        longitude: f64,
        /// Record time.
        timestamp: DateTime<Utc>,
    },
    /// Officer position forwarded from a connected client.
    UnitLoc {
        /// Reporting unit, if known.
        #[serde(skip_serializing_if = "Option::is_none")]
        unit_number: Option<UnitNumber>,
        /// Latitude.
        latitude: f64,
        /// Longitude.
        longitude: f64,
        /// Receive time.
        timestamp: DateTime<Utc>,
    },
    /// An officer unit was assigned to an incident.
    OfficerAssigned {
        /// Incident id.
        sos_id: IncidentId,
        /// Incident room id.
        room_id: String,
        /// Assigned unit.
        unit_number: UnitNumber,
        /// Officer name, if supplied.
        #[serde(skip_serializing_if = "Option::is_none")]
        officer_name: Option<String>,
    },
    /// An incident was resolved.
    IncidentResolved {
        /// Incident id.
        sos_id: IncidentId,
        /// Incident room id.
        room_id: String,
    },
    /// Result of an ingress frame.
    IngressResponse {
        /// Whether the event was accepted.
        success: bool,
        /// Event kind, when accepted.
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<String>,
        /// Messages delivered, when accepted.
        #[serde(skip_serializing_if = "Option::is_none")]
        deliveries: Option<usize>,
        /// Failure reason.
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Result of a relayed `create_sos`.
    CreateSosResponse(RelayResponse),
    /// Result of a relayed `update_location`.
    UpdateLocationResponse(RelayResponse),
    /// Server heartbeat.
    Ping {
        /// Server time.
        timestamp: DateTime<Utc>,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// The wire `type` tag of this message.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::ConnectionEstablished { .. } => "connection_established",
            Self::RoomJoined { .. } => "room_joined",
            Self::RoomLeft { .. } => "room_left",
            Self::NewSos { .. } => "new_sos",
            Self::LocationHistory { .. } => "location_history",
            Self::UnitLocationUpdate { .. } => "unit_location_update",
            Self::LocationTrackingUpdate { .. } => "location_tracking_update",
            Self::UnitLoc { .. } => "unit_loc",
            Self::OfficerAssigned { .. } => "officer_assigned",
            Self::IncidentResolved { .. } => "incident_resolved",
            Self::IngressResponse { .. } => "ingress_response",
            Self::CreateSosResponse(_) => "create_sos_response",
            Self::UpdateLocationResponse(_) => "update_location_response",
            Self::Ping { .. } => "ping",
            Self::Error { .. } => "error",
        }
    }
}
