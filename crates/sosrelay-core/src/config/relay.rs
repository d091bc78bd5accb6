//! System-of-record relay configuration.

use serde::{Deserialize, Serialize};

/// Where client-originated `create_sos` / `update_location` requests go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Base URL of the system-of-record API (e.g. `http://localhost:8000`).
    /// The relay is disabled when unset.
    #[serde(default)]
    pub record_api_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            record_api_url: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}
