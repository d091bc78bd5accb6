//! Realtime engine metrics.

pub mod connections;
pub mod ingress;
pub mod messages;
pub mod rooms;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Total messages queued to clients
    pub messages_sent: AtomicU64,
    /// Total frames received from clients
    pub messages_received: AtomicU64,
    /// Messages not delivered because the connection was gone or full
    pub messages_dropped: AtomicU64,
    /// Total connections established
    pub connections_total: AtomicU64,
    /// Connections currently active
    pub connections_active: AtomicU64,
    /// Connections closed because their outbound queue overflowed
    pub slow_consumer_disconnects: AtomicU64,
    /// Total room joins
    pub joins_total: AtomicU64,
    /// History replays sent after an incident join
    pub replays_sent: AtomicU64,
    /// Ingress events accepted
    pub ingress_accepted: AtomicU64,
    /// Ingress events rejected as malformed
    pub ingress_rejected: AtomicU64,
    /// Relay calls answered with success
    pub relay_successes: AtomicU64,
    /// Relay calls that failed
    pub relay_failures: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_dropped: self.messages_dropped.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            slow_consumer_disconnects: self.slow_consumer_disconnects.load(Ordering::Relaxed),
            joins_total: self.joins_total.load(Ordering::Relaxed),
            replays_sent: self.replays_sent.load(Ordering::Relaxed),
            ingress_accepted: self.ingress_accepted.load(Ordering::Relaxed),
            ingress_rejected: self.ingress_rejected.load(Ordering::Relaxed),
            relay_successes: self.relay_successes.load(Ordering::Relaxed),
            relay_failures: self.relay_failures.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total messages queued to clients
    pub messages_sent: u64,
    /// Total frames received from clients
    pub messages_received: u64,
    /// Messages not delivered
    pub messages_dropped: u64,
    /// Total connections ever established
    pub connections_total: u64,
    /// Currently active connections
    pub connections_active: u64,
    /// Slow-consumer disconnects
    pub slow_consumer_disconnects: u64,
    /// Total room joins
    pub joins_total: u64,
    /// History replays sent
    pub replays_sent: u64,
    /// Ingress events accepted
    pub ingress_accepted: u64,
    /// Ingress events rejected
    pub ingress_rejected: u64,
    /// Relay successes
    pub relay_successes: u64,
    /// Relay failures
    pub relay_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_feed_snapshot() {
        let metrics = EngineMetrics::new();
        connections::record_connect(&metrics);
        connections::record_connect(&metrics);
        connections::record_disconnect(&metrics);
        messages::record_sent_count(&metrics, 3);
        ingress::record_rejected(&metrics);
        rooms::record_join(&metrics);

        let snap = metrics.snapshot();
        assert_eq!(snap.connections_total, 2);
        assert_eq!(snap.connections_active, 1);
        assert_eq!(snap.messages_sent, 3);
        assert_eq!(snap.ingress_rejected, 1);
        assert_eq!(snap.joins_total, 1);
    }
}
