//! Ingress event model.
//!
//! Events from the system-of-record arrive as `{"kind": ..., "payload":
//! {...}}`. Payloads are validated here before anything is broadcast.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use sosrelay_core::types::{IncidentId, UnitNumber};

use super::de;

/// An event pushed by the system-of-record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum IngressEvent {
    /// A new incident exists.
    #[serde(alias = "sos_created")]
    IncidentCreated(IncidentCreated),
    /// The incident's reporter moved.
    #[serde(alias = "location_update_to_room")]
    LocationUpdated(LocationUpdated),
    /// Location relayed to the incident's unit only.
    #[serde(alias = "location_update_to_unit")]
    UnitLocationUpdated(UnitLocationUpdated),
    /// A unit was assigned to the incident.
    OfficerAssigned(OfficerAssigned),
    /// The incident is closed.
    IncidentResolved(IncidentResolved),
}

impl IngressEvent {
    /// Canonical snake_case kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IncidentCreated(_) => "incident_created",
            Self::LocationUpdated(_) => "location_updated",
            Self::UnitLocationUpdated(_) => "unit_location_updated",
            Self::OfficerAssigned(_) => "officer_assigned",
            Self::IncidentResolved(_) => "incident_resolved",
        }
    }

    /// Incident the event concerns.
    pub fn sos_id(&self) -> IncidentId {
        match self {
            Self::IncidentCreated(e) => e.sos_id,
            Self::LocationUpdated(e) => e.sos_id,
            Self::UnitLocationUpdated(e) => e.sos_id,
            Self::OfficerAssigned(e) => e.sos_id,
            Self::IncidentResolved(e) => e.sos_id,
        }
    }

    /// Validates the payload.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::IncidentCreated(e) => e.validate(),
            Self::LocationUpdated(e) => e.validate(),
            Self::UnitLocationUpdated(e) => e.validate(),
            Self::OfficerAssigned(_) | Self::IncidentResolved(_) => Ok(()),
        }
    }
}

fn room_id_or_default(sos_id: IncidentId, room_id: &Option<String>) -> String {
    room_id
        .clone()
        .unwrap_or_else(|| sos_id.default_room_id())
}

/// Payload of `incident_created`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IncidentCreated {
    /// Incident id.
    #[serde(deserialize_with = "de::incident_id")]
    pub sos_id: IncidentId,
    /// Room id; defaults to the incident id.
    #[serde(default, deserialize_with = "de::optional_room_id")]
    pub room_id: Option<String>,
    /// Reporter name.
    #[validate(length(min = 1))]
    pub name: String,
    /// Incident category code.
    #[serde(default)]
    pub sos_type: i32,
    /// Initial latitude.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Initial longitude.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Creation time; defaults to receive time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl IncidentCreated {
    /// Effective room id.
    pub fn room_id(&self) -> String {
        room_id_or_default(self.sos_id, &self.room_id)
    }
}

/// Payload of `location_updated`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationUpdated {
    /// Incident id.
    #[serde(deserialize_with = "de::incident_id")]
    pub sos_id: IncidentId,
    /// Room id; defaults to the incident id.
    #[serde(default, deserialize_with = "de::optional_room_id")]
    pub room_id: Option<String>,
    /// Latitude.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Record time; defaults to receive time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Unit to fan out to; defaults to the incident's assignment.
    #[serde(default, deserialize_with = "de::optional_unit_number")]
    pub unit_number: Option<UnitNumber>,
}

impl LocationUpdated {
    /// Effective room id.
    pub fn room_id(&self) -> String {
        room_id_or_default(self.sos_id, &self.room_id)
    }
}

/// Payload of `unit_location_updated`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UnitLocationUpdated {
    /// Target unit.
    #[serde(deserialize_with = "de::unit_number")]
    pub unit_number: UnitNumber,
    /// Incident id.
    #[serde(deserialize_with = "de::incident_id")]
    pub sos_id: IncidentId,
    /// Latitude.
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    /// Longitude.
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Record time; defaults to receive time.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Payload of `officer_assigned`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficerAssigned {
    /// Incident id.
    #[serde(deserialize_with = "de::incident_id")]
    pub sos_id: IncidentId,
    /// Room id; defaults to the incident id.
    #[serde(default, deserialize_with = "de::optional_room_id")]
    pub room_id: Option<String>,
    /// Assigned unit.
    #[serde(deserialize_with = "de::unit_number")]
    pub unit_number: UnitNumber,
    /// Officer name.
    #[serde(default)]
    pub officer_name: Option<String>,
}

impl OfficerAssigned {
    /// Effective room id.
    pub fn room_id(&self) -> String {
        room_id_or_default(self.sos_id, &self.room_id)
    }
}

/// Payload of `incident_resolved`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncidentResolved {
    /// Incident id.
    #[serde(deserialize_with = "de::incident_id")]
    pub sos_id: IncidentId,
    /// Room id; defaults to the incident id.
    #[serde(default, deserialize_with = "de::optional_room_id")]
    pub room_id: Option<String>,
}

impl IncidentResolved {
    /// Effective room id.
    pub fn room_id(&self) -> String {
        room_id_or_default(self.sos_id, &self.room_id)
    }
}
