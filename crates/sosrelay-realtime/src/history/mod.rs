//! Per-incident recent location history, replayed to late joiners.

pub mod buffer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sosrelay_core::types::{IncidentId, UnitNumber};

pub use buffer::{HistoryBuffer, IncidentGuard, IncidentLog};

/// One recorded location of an incident. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEvent {
    /// Incident the location belongs to.
    pub sos_id: IncidentId,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// When the system-of-record recorded the location.
    pub timestamp: DateTime<Utc>,
    /// Unit that reported the location, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_number: Option<UnitNumber>,
}
