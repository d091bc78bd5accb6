//! Location history retention configuration.

use serde::{Deserialize, Serialize};

/// Bounds on the in-memory per-incident location history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Events kept per incident; the oldest are dropped first.
    #[serde(default = "default_max_events")]
    pub max_events_per_incident: usize,
    /// Incident buffers kept at once.
    #[serde(default = "default_max_incidents")]
    pub max_incidents: u64,
    /// Seconds after which an untouched incident buffer expires.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_seconds: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_events_per_incident: default_max_events(),
            max_incidents: default_max_incidents(),
            idle_ttl_seconds: default_idle_ttl(),
        }
    }
}

fn default_max_events() -> usize {
    500
}

fn default_max_incidents() -> u64 {
    10_000
}

fn default_idle_ttl() -> u64 {
    86_400
}
