//! Room metrics helpers.

use std::sync::atomic::Ordering;

use super::EngineMetrics;

/// Record a room join
pub fn record_join(metrics: &EngineMetrics) {
    metrics.joins_total.fetch_add(1, Ordering::Relaxed);
}

/// Record a history replay
pub fn record_replay(metrics: &EngineMetrics) {
    metrics.replays_sent.fetch_add(1, Ordering::Relaxed);
}
