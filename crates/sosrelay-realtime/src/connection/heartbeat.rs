//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use sosrelay_core::config::RealtimeConfig;

use crate::message::builder::build_ping;

use super::handle::{ConnectionHandle, Delivery};

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Timeout before considering connection dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds),
        }
    }
}

/// Run heartbeat loop for a connection.
///
/// Sends periodic pings and checks for pong responses.
/// Marks the connection as dead if pong is not received within timeout.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let cancel = handle.cancellation();
    let mut interval = time::interval(config.ping_interval);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let last_pong = *handle.last_pong.read().await;
        let elapsed = Utc::now() - last_pong;

        if let Ok(elapsed_std) = elapsed.to_std() {
            if elapsed_std > config.ping_timeout {
                tracing::warn!(
                    conn_id = %handle.id,
                    "Heartbeat timeout (last pong: {:?} ago)",
                    elapsed_std
                );
                handle.mark_dead();
                break;
            }
        }

        if handle.send(build_ping(), None) != Delivery::Sent {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, marking dead");
            handle.mark_dead();
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use crate::message::types::OutboundMessage;

    use super::*;

    fn config(interval: u64, timeout: u64) -> HeartbeatConfig {
        HeartbeatConfig {
            ping_interval: Duration::from_secs(interval),
            ping_timeout: Duration::from_secs(timeout),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sends_ping_each_interval() {
        let (tx, mut rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(tx));
        let task = tokio::spawn(run_heartbeat(handle.clone(), config(25, 600)));

        let envelope = rx.recv().await.expect("ping");
        assert!(matches!(envelope.data, OutboundMessage::Ping { .. }));

        handle.mark_dead();
        task.await.expect("heartbeat task");
    }

    #[tokio::test]
    async fn test_stale_pong_marks_dead() {
        let (tx, _rx) = mpsc::channel(8);
        let handle = Arc::new(ConnectionHandle::new(tx));
        *handle.last_pong.write().await = Utc::now() - chrono::Duration::seconds(120);

        run_heartbeat(
            handle.clone(),
            HeartbeatConfig {
                ping_interval: Duration::from_millis(10),
                ping_timeout: Duration::from_secs(60),
            },
        )
        .await;
        assert!(!handle.is_alive());
    }
}
