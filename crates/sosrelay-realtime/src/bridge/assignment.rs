//! Incident → unit assignment table.
//!
//! Bounded the same way as incident history: an incident nobody updates
//! within the idle TTL, or one pushed out by capacity, loses its
//! assignment along with its history.

use std::time::Duration;

use moka::sync::Cache;

use sosrelay_core::config::HistoryConfig;
use sosrelay_core::types::{IncidentId, UnitNumber};

/// Which unit each open incident is assigned to.
#[derive(Debug)]
pub struct UnitAssignments {
    by_incident: Cache<IncidentId, UnitNumber>,
}

impl UnitAssignments {
    /// Creates an empty table bounded by `config`.
    pub fn new(config: &HistoryConfig) -> Self {
        let by_incident = Cache::builder()
            .max_capacity(config.max_incidents)
            .time_to_idle(Duration::from_secs(config.idle_ttl_seconds))
            .build();
        Self { by_incident }
    }

    /// Records an assignment, returning the unit it replaced.
    pub fn assign(&self, sos_id: IncidentId, unit: UnitNumber) -> Option<UnitNumber> {
        let previous = self.by_incident.remove(&sos_id);
        self.by_incident.insert(sos_id, unit);
        previous
    }

    /// Unit assigned to an incident.
    pub fn get(&self, sos_id: IncidentId) -> Option<UnitNumber> {
        self.by_incident.get(&sos_id)
    }

    /// Drops an incident's assignment.
    pub fn clear(&self, sos_id: IncidentId) -> Option<UnitNumber> {
        self.by_incident.remove(&sos_id)
    }

    /// Number of assigned incidents.
    pub fn len(&self) -> usize {
        self.by_incident.run_pending_tasks();
        self.by_incident.entry_count() as usize
    }

    /// Whether no incident is assigned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
