//! Lenient deserializers for identifiers coming from other systems.
//!
//! Incident ids, room ids and unit numbers arrive as either JSON strings
//! or numbers depending on the sender.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use sosrelay_core::types::{IncidentId, UnitNumber};

use crate::message::validator::identifier;
use crate::room::RoomKey;

/// Incident id given as an integer or a numeric string.
pub fn incident_id<'de, D>(de: D) -> Result<IncidentId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::Number(n) => n
            .as_i64()
            .map(IncidentId)
            .ok_or_else(|| D::Error::custom("incident id must be an integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(IncidentId)
            .map_err(|_| D::Error::custom("incident id must be an integer")),
        _ => Err(D::Error::custom("incident id must be an integer")),
    }
}

/// Optional identifier; blank values count as absent.
pub fn optional_identifier<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(identifier(value.as_ref()))
}

/// Optional incident room id; blank values count as absent.
pub fn optional_room_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match optional_identifier(de)? {
        Some(raw) => RoomKey::incident(&raw)
            .map(|_| Some(raw.clone()))
            .ok_or_else(|| D::Error::custom(format!("invalid room_id: {raw}"))),
        None => Ok(None),
    }
}

/// Required unit number.
pub fn unit_number<'de, D>(de: D) -> Result<UnitNumber, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(de)?;
    identifier(Some(&value))
        .and_then(|raw| UnitNumber::parse(&raw))
        .ok_or_else(|| D::Error::custom("unit_number must be a non-blank string or number"))
}

/// Optional unit number; blank values count as absent.
pub fn optional_unit_number<'de, D>(de: D) -> Result<Option<UnitNumber>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(identifier(value.as_ref()).and_then(|raw| UnitNumber::parse(&raw)))
}
