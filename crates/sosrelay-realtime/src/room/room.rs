//! Single room with subscriber tracking.

use std::collections::HashSet;

use sosrelay_core::types::ConnectionId;

use super::key::RoomKey;

/// A single broadcast room with a set of subscribers.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room key.
    pub key: RoomKey,
    /// Set of subscribed connection IDs.
    pub subscribers: HashSet<ConnectionId>,
}

impl Room {
    /// Creates a new empty room.
    pub fn new(key: RoomKey) -> Self {
        Self {
            key,
            subscribers: HashSet::new(),
        }
    }

    /// Adds a subscriber. Returns `false` if it was already present.
    pub fn subscribe(&mut self, conn_id: ConnectionId) -> bool {
        self.subscribers.insert(conn_id)
    }

    /// Removes a subscriber.
    pub fn unsubscribe(&mut self, conn_id: ConnectionId) -> bool {
        self.subscribers.remove(&conn_id)
    }

    /// Returns subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns whether the room has any subscribers.
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Returns all subscriber connection IDs.
    pub fn get_subscribers(&self) -> Vec<ConnectionId> {
        self.subscribers.iter().copied().collect()
    }
}
