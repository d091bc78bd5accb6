//! Ingress and relay metrics helpers.

use std::sync::atomic::Ordering;

use super::EngineMetrics;

/// Record an accepted ingress event
pub fn record_accepted(metrics: &EngineMetrics) {
    metrics.ingress_accepted.fetch_add(1, Ordering::Relaxed);
}

/// Record a rejected ingress event
pub fn record_rejected(metrics: &EngineMetrics) {
    metrics.ingress_rejected.fetch_add(1, Ordering::Relaxed);
}

/// Record the outcome of a relayed request
pub fn record_relay(metrics: &EngineMetrics, success: bool) {
    let counter = if success {
        &metrics.relay_successes
    } else {
        &metrics.relay_failures
    };
    counter.fetch_add(1, Ordering::Relaxed);
}
