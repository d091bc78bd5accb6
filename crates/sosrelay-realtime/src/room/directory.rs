//! Room directory managing all rooms and memberships.
//!
//! A room exists only while it has subscribers. Emptied rooms are removed
//! with `remove_if`, which re-checks emptiness under the shard lock, so a
//! connection joining at the same moment is never dropped.

use dashmap::DashMap;

use sosrelay_core::types::ConnectionId;

use super::key::RoomKey;
use super::room::Room;
use super::subscription::SubscriptionTracker;

/// Directory of all non-empty rooms.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    /// Room key → Room.
    rooms: DashMap<RoomKey, Room>,
    /// Subscription tracker (reverse index).
    subscriptions: SubscriptionTracker,
}

impl RoomDirectory {
    /// Creates an empty room directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a room. Returns `false` if it was already a
    /// member.
    pub fn join(&self, room: RoomKey, conn_id: ConnectionId) -> bool {
        let added = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| Room::new(room.clone()))
            .subscribe(conn_id);

        self.subscriptions.add(conn_id, room);
        added
    }

    /// Removes a connection from a room. Unknown rooms are a no-op.
    pub fn leave(&self, room: &RoomKey, conn_id: ConnectionId) -> bool {
        let removed = self.detach(room, conn_id);
        self.subscriptions.remove(conn_id, room);
        removed
    }

    /// Removes a connection from every room it joined. Returns the rooms
    /// it left.
    pub fn leave_all(&self, conn_id: ConnectionId) -> Vec<RoomKey> {
        let rooms = self.subscriptions.remove_all(conn_id);
        for room in &rooms {
            self.detach(room, conn_id);
        }
        rooms.into_iter().collect()
    }

    fn detach(&self, room: &RoomKey, conn_id: ConnectionId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut entry) => entry.unsubscribe(conn_id),
            None => false,
        };
        self.rooms.remove_if(room, |_, r| r.is_empty());
        removed
    }

    /// Returns all subscriber connection IDs for a room.
    pub fn subscribers(&self, room: &RoomKey) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|r| r.get_subscribers())
            .unwrap_or_default()
    }

    /// Whether the connection is a member of the room.
    pub fn is_member(&self, room: &RoomKey, conn_id: ConnectionId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|r| r.subscribers.contains(&conn_id))
    }

    /// Rooms a connection has joined.
    pub fn rooms_of(&self, conn_id: ConnectionId) -> Vec<RoomKey> {
        self.subscriptions.get_rooms(conn_id).into_iter().collect()
    }

    /// Whether the connection's joined-room set contains the room.
    pub fn has_joined(&self, conn_id: ConnectionId, room: &RoomKey) -> bool {
        self.subscriptions.contains(conn_id, room)
    }

    /// Returns the number of rooms a connection has joined.
    pub fn subscription_count(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns subscriber count for a room.
    pub fn room_subscriber_count(&self, room: &RoomKey) -> usize {
        self.rooms
            .get(room)
            .map(|r| r.subscriber_count())
            .unwrap_or(0)
    }

    /// Returns total number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sosrelay_core::types::UnitNumber;

    use super::*;

    fn incident(id: &str) -> RoomKey {
        RoomKey::Incident(id.to_string())
    }

    #[test]
    fn test_join_is_idempotent() {
        let dir = RoomDirectory::new();
        let conn = ConnectionId::new();
        assert!(dir.join(incident("1"), conn));
        assert!(!dir.join(incident("1"), conn));
        assert_eq!(dir.room_subscriber_count(&incident("1")), 1);
        assert_eq!(dir.subscription_count(conn), 1);
    }

    #[test]
    fn test_leave_removes_empty_room() {
        let dir = RoomDirectory::new();
        let conn = ConnectionId::new();
        dir.join(RoomKey::IncidentChannel, conn);
        assert!(dir.leave(&RoomKey::IncidentChannel, conn));
        assert_eq!(dir.room_count(), 0);
        assert!(!dir.is_member(&RoomKey::IncidentChannel, conn));
        assert!(!dir.has_joined(conn, &RoomKey::IncidentChannel));
    }

    #[test]
    fn test_leave_unknown_room_is_noop() {
        let dir = RoomDirectory::new();
        assert!(!dir.leave(&incident("missing"), ConnectionId::new()));
        assert!(dir.subscribers(&incident("missing")).is_empty());
    }

    #[test]
    fn test_leave_all_clears_every_membership() {
        let dir = RoomDirectory::new();
        let conn = ConnectionId::new();
        let other = ConnectionId::new();
        let unit = RoomKey::Unit(UnitNumber::parse("7").expect("unit"));
        dir.join(incident("1"), conn);
        dir.join(unit.clone(), conn);
        dir.join(RoomKey::TrackingChannel, conn);
        dir.join(RoomKey::TrackingChannel, other);

        let mut left = dir.leave_all(conn);
        left.sort_by_key(|r| r.to_room_name());
        assert_eq!(left.len(), 3);

        assert!(dir.rooms_of(conn).is_empty());
        assert!(!dir.is_member(&incident("1"), conn));
        assert!(!dir.is_member(&unit, conn));
        assert_eq!(dir.subscribers(&RoomKey::TrackingChannel), vec![other]);
        assert_eq!(dir.room_count(), 1);
    }

    #[test]
    fn test_membership_mirrors_reverse_index() {
        let dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        dir.join(incident("9"), a);
        dir.join(incident("9"), b);
        dir.leave(&incident("9"), a);

        for conn in [a, b] {
            assert_eq!(
                dir.is_member(&incident("9"), conn),
                dir.has_joined(conn, &incident("9"))
            );
        }
    }

    #[test]
    fn test_concurrent_join_leave_keeps_stayers() {
        let dir = Arc::new(RoomDirectory::new());
        let room = incident("busy");
        let stayers: Vec<ConnectionId> = (0..8).map(|_| ConnectionId::new()).collect();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let dir = dir.clone();
                let room = room.clone();
                let stayer = stayers[i];
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let churn = ConnectionId::new();
                        dir.join(room.clone(), churn);
                        dir.leave(&room, churn);
                    }
                    dir.join(room, stayer);
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread");
        }

        let mut members = dir.subscribers(&room);
        members.sort_by_key(|c| c.into_uuid());
        let mut expected = stayers.clone();
        expected.sort_by_key(|c| c.into_uuid());
        assert_eq!(members, expected);
    }
}
