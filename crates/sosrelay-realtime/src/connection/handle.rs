//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use sosrelay_core::types::{ConnectionId, UnitNumber};

use crate::message::envelope::MessageEnvelope;
use crate::message::types::OutboundMessage;
use crate::room::RoomKey;

/// Outcome of queueing a message for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the writer task.
    Sent,
    /// The outbound queue was full; the connection has been marked dead.
    Overflowed,
    /// The connection is already gone.
    Closed,
}

/// A handle to a single WebSocket connection.
///
/// Holds the bounded sender for pushing messages to the client's writer
/// task. Every queued message gets the next per-connection sequence
/// number; the counter is locked across the enqueue so `seq` order and
/// queue order agree.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound messages
    sender: mpsc::Sender<MessageEnvelope>,
    /// Last sequence number handed out
    seq: Mutex<u64>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last activity timestamp
    pub last_activity: RwLock<DateTime<Utc>>,
    /// Last pong received
    pub last_pong: RwLock<DateTime<Utc>>,
    /// Whether the connection is still alive
    alive: AtomicBool,
    /// Cancelled when the connection must be torn down
    cancel: CancellationToken,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(sender: mpsc::Sender<MessageEnvelope>) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            sender,
            seq: Mutex::new(0),
            connected_at: now,
            last_activity: RwLock::new(now),
            last_pong: RwLock::new(now),
            alive: AtomicBool::new(true),
            cancel: CancellationToken::new(),
        }
    }

    /// Queue an outbound message without waiting.
    ///
    /// A full queue marks the connection dead instead of blocking the
    /// caller or silently skipping the message.
    pub fn send(&self, msg: OutboundMessage, room: Option<&RoomKey>) -> Delivery {
        if !self.is_alive() {
            return Delivery::Closed;
        }

        let mut seq = self.seq.lock().unwrap_or_else(PoisonError::into_inner);
        let envelope = MessageEnvelope::frame(msg, room, *seq + 1);

        match self.sender.try_send(envelope) {
            Ok(()) => {
                *seq += 1;
                Delivery::Sent
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Outbound queue full, disconnecting slow consumer");
                self.mark_dead();
                Delivery::Overflowed
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Delivery::Closed
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead and wake anything waiting on it
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.cancel.cancel();
    }

    /// Token cancelled once the connection is dead
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Update last activity timestamp
    pub async fn touch(&self) {
        let mut la = self.last_activity.write().await;
        *la = Utc::now();
    }

    /// Record a pong response
    pub async fn record_pong(&self) {
        let now = Utc::now();
        *self.last_pong.write().await = now;
        *self.last_activity.write().await = now;
    }

    /// Last sequence number handed out
    pub fn last_seq(&self) -> u64 {
        *self.seq.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Role a session has declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum SessionRole {
    /// No role declared yet.
    Unspecified,
    /// Officer of a dispatch unit.
    Officer {
        /// The unit the officer belongs to.
        unit_number: UnitNumber,
    },
}

/// Snapshot of session info (serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Declared role
    #[serde(flatten)]
    pub role: SessionRole,
    /// Joined room names
    pub rooms: Vec<String>,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Last activity
    pub last_activity: DateTime<Utc>,
    /// Is alive
    pub alive: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ping() -> OutboundMessage {
        OutboundMessage::Ping {
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_seq_increases_per_message() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = ConnectionHandle::new(tx);
        assert_eq!(handle.send(ping(), None), Delivery::Sent);
        assert_eq!(handle.send(ping(), Some(&RoomKey::IncidentChannel)), Delivery::Sent);

        let first = rx.recv().await.expect("first");
        let second = rx.recv().await.expect("second");
        assert_eq!((first.seq, second.seq), (1, 2));
        assert_eq!(first.room, None);
        assert_eq!(second.room.as_deref(), Some("sos_channel"));
    }

    #[tokio::test]
    async fn test_full_queue_marks_dead() {
        let (tx, _rx) = mpsc::channel(1);
        let handle = ConnectionHandle::new(tx);
        let token = handle.cancellation();
        assert_eq!(handle.send(ping(), None), Delivery::Sent);
        assert_eq!(handle.send(ping(), None), Delivery::Overflowed);
        assert!(!handle.is_alive());
        assert!(token.is_cancelled());
        assert_eq!(handle.send(ping(), None), Delivery::Closed);
        assert_eq!(handle.last_seq(), 1);
    }

    #[tokio::test]
    async fn test_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = ConnectionHandle::new(tx);
        assert_eq!(handle.send(ping(), None), Delivery::Closed);
        assert!(!handle.is_alive());
    }
}
