//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section, and every field carries a serde default so an empty file is
//! a valid configuration.

pub mod app;
pub mod history;
pub mod logging;
pub mod realtime;
pub mod relay;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::history::HistoryConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::relay::RelayConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Real-time WebSocket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Per-incident location history retention.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Relay to the system-of-record API.
    #[serde(default)]
    pub relay: RelayConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// (`config/{env}.toml`) and environment variables prefixed with
    /// `SOSRELAY__` (e.g. `SOSRELAY__SERVER__PORT=9000`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config", env)
    }

    /// Same as [`AppConfig::load`], reading TOML files from `dir`.
    pub fn load_from(dir: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("{dir}/default")).required(false))
            .add_source(config::File::with_name(&format!("{dir}/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SOSRELAY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }

    /// Rejects values that would make the hub misbehave at runtime.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.realtime.channel_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.channel_buffer_size must be greater than zero",
            ));
        }
        if self.history.max_events_per_incident == 0 {
            return Err(AppError::configuration(
                "history.max_events_per_incident must be greater than zero",
            ));
        }
        if self.history.max_incidents == 0 {
            return Err(AppError::configuration(
                "history.max_incidents must be greater than zero",
            ));
        }
        if self.history.idle_ttl_seconds == 0 {
            return Err(AppError::configuration(
                "history.idle_ttl_seconds must be greater than zero",
            ));
        }
        if self.realtime.ping_interval_seconds == 0 {
            return Err(AppError::configuration(
                "realtime.ping_interval_seconds must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8001);
        assert_eq!(config.history.max_events_per_incident, 500);
        assert!(config.relay.record_api_url.is_none());
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let mut config = AppConfig::default();
        config.realtime.channel_buffer_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_history_bounds_rejected() {
        let mut config = AppConfig::default();
        config.history.max_incidents = 0;
        let err = config.validate().expect_err("max_incidents");
        assert!(err.message.contains("history.max_incidents"));

        let mut config = AppConfig::default();
        config.history.idle_ttl_seconds = 0;
        let err = config.validate().expect_err("idle_ttl_seconds");
        assert!(err.message.contains("history.idle_ttl_seconds"));
    }

    #[test]
    fn test_load_missing_directory_uses_defaults() {
        let config = AppConfig::load_from("does-not-exist", "test").expect("defaults load");
        assert_eq!(config.logging.level, "info");
    }
}
