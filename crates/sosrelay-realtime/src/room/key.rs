//! Room key definitions and parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use sosrelay_core::types::UnitNumber;

const INCIDENT_CHANNEL: &str = "sos_channel";
const TRACKING_CHANNEL: &str = "location_tracking_channel";
const INCIDENT_PREFIX: &str = "sos_";
const UNIT_PREFIX: &str = "unit_";
const RESERVED_INCIDENT_ID: &str = "channel";

/// Typed room identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RoomKey {
    /// Per-incident room, keyed by the incident's room id.
    Incident(String),
    /// Per-unit room for officers of one dispatch unit.
    Unit(UnitNumber),
    /// Global feed of newly created incidents.
    IncidentChannel,
    /// Global feed of unit location updates.
    TrackingChannel,
}

impl RoomKey {
    /// Incident room for `room_id`.
    ///
    /// `None` for a blank id, or for `channel`, whose room name would be
    /// the global incident channel's.
    pub fn incident(room_id: &str) -> Option<Self> {
        let room_id = room_id.trim();
        if room_id.is_empty() || room_id == RESERVED_INCIDENT_ID {
            return None;
        }
        Some(RoomKey::Incident(room_id.to_string()))
    }

    /// Parses a room name (`sos_<id>`, `unit_<n>`, `sos_channel`,
    /// `location_tracking_channel`) into a typed key.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            INCIDENT_CHANNEL => Some(RoomKey::IncidentChannel),
            TRACKING_CHANNEL => Some(RoomKey::TrackingChannel),
            _ => {
                if let Some(id) = name.strip_prefix(INCIDENT_PREFIX) {
                    RoomKey::incident(id)
                } else if let Some(unit) = name.strip_prefix(UNIT_PREFIX) {
                    UnitNumber::parse(unit).map(RoomKey::Unit)
                } else {
                    None
                }
            }
        }
    }

    /// Converts back to a room name.
    pub fn to_room_name(&self) -> String {
        match self {
            RoomKey::Incident(id) => format!("{INCIDENT_PREFIX}{id}"),
            RoomKey::Unit(unit) => format!("{UNIT_PREFIX}{unit}"),
            RoomKey::IncidentChannel => INCIDENT_CHANNEL.to_string(),
            RoomKey::TrackingChannel => TRACKING_CHANNEL.to_string(),
        }
    }

    /// Incident room id, if this is an incident room.
    pub fn incident_room_id(&self) -> Option<&str> {
        match self {
            RoomKey::Incident(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_room_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_channels_before_prefixes() {
        assert_eq!(RoomKey::parse("sos_channel"), Some(RoomKey::IncidentChannel));
        assert_eq!(
            RoomKey::parse("location_tracking_channel"),
            Some(RoomKey::TrackingChannel)
        );
    }

    #[test]
    fn test_parse_incident_and_unit() {
        assert_eq!(
            RoomKey::parse("sos_4f1c"),
            Some(RoomKey::Incident("4f1c".to_string()))
        );
        let unit = UnitNumber::parse("PCR-12").expect("unit");
        assert_eq!(RoomKey::parse("unit_PCR-12"), Some(RoomKey::Unit(unit)));
    }

    #[test]
    fn test_parse_rejects_unknown_and_blank() {
        assert_eq!(RoomKey::parse("admin:system"), None);
        assert_eq!(RoomKey::parse("sos_"), None);
        assert_eq!(RoomKey::parse("unit_  "), None);
    }

    #[test]
    fn test_incident_id_cannot_alias_global_channel() {
        assert_eq!(RoomKey::incident("channel"), None);
        assert_eq!(RoomKey::incident(" "), None);
        assert_eq!(
            RoomKey::incident(" 12 "),
            Some(RoomKey::Incident("12".to_string()))
        );
    }

    #[test]
    fn test_room_name_roundtrip() {
        for name in ["sos_1", "unit_7", "sos_channel", "location_tracking_channel"] {
            let key = RoomKey::parse(name).expect("parse");
            assert_eq!(key.to_room_name(), name);
        }
    }
}
