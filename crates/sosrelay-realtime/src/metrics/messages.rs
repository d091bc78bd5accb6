//! Message metrics helpers.

use std::sync::atomic::Ordering;

use super::EngineMetrics;

/// Record messages queued to clients
pub fn record_sent_count(metrics: &EngineMetrics, count: u64) {
    metrics.messages_sent.fetch_add(count, Ordering::Relaxed);
}

/// Record a frame received from a client
pub fn record_received(metrics: &EngineMetrics) {
    metrics.messages_received.fetch_add(1, Ordering::Relaxed);
}

/// Record a message that could not be queued
pub fn record_dropped(metrics: &EngineMetrics) {
    metrics.messages_dropped.fetch_add(1, Ordering::Relaxed);
}
