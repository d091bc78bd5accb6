//! Subscription tracking: which rooms each connection has joined.

use std::collections::HashSet;

use dashmap::DashMap;

use sosrelay_core::types::ConnectionId;

use super::key::RoomKey;

/// Tracks connection-to-room mappings (reverse index).
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection ID → set of room keys.
    conn_to_rooms: DashMap<ConnectionId, HashSet<RoomKey>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription.
    pub fn add(&self, conn_id: ConnectionId, room: RoomKey) {
        self.conn_to_rooms.entry(conn_id).or_default().insert(room);
    }

    /// Removes a subscription, dropping the connection's entry once empty.
    pub fn remove(&self, conn_id: ConnectionId, room: &RoomKey) {
        if let Some(mut rooms) = self.conn_to_rooms.get_mut(&conn_id) {
            rooms.remove(room);
        }
        self.conn_to_rooms
            .remove_if(&conn_id, |_, rooms| rooms.is_empty());
    }

    /// Gets all rooms a connection has joined.
    pub fn get_rooms(&self, conn_id: ConnectionId) -> HashSet<RoomKey> {
        self.conn_to_rooms
            .get(&conn_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether the connection has joined the room.
    pub fn contains(&self, conn_id: ConnectionId, room: &RoomKey) -> bool {
        self.conn_to_rooms
            .get(&conn_id)
            .is_some_and(|rooms| rooms.contains(room))
    }

    /// Returns the number of rooms a connection has joined.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.conn_to_rooms
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes all subscriptions for a connection.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<RoomKey> {
        self.conn_to_rooms
            .remove(&conn_id)
            .map(|(_, rooms)| rooms)
            .unwrap_or_default()
    }
}
