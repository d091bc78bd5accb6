//! Connection manager: connection lifecycle, room membership and delivery.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use sosrelay_core::config::RealtimeConfig;
use sosrelay_core::error::AppError;
use sosrelay_core::types::{ConnectionId, UnitNumber};
use sosrelay_core::AppResult;

use crate::history::HistoryBuffer;
use crate::message::builder::{build_connection_established, build_replay, build_room_joined};
use crate::message::envelope::MessageEnvelope;
use crate::message::types::OutboundMessage;
use crate::metrics::{EngineMetrics, connections, messages, rooms};
use crate::room::{RoomDirectory, RoomKey};

use super::handle::{ConnectionHandle, Delivery, SessionInfo};
use super::pool::ConnectionPool;

/// Manages all active WebSocket connections.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Session registry.
    pool: Arc<ConnectionPool>,
    /// Room directory.
    rooms: Arc<RoomDirectory>,
    /// Incident history, locked across join + replay.
    history: Arc<HistoryBuffer>,
    /// Metrics.
    metrics: Arc<EngineMetrics>,
    /// Configuration.
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        rooms: Arc<RoomDirectory>,
        history: Arc<HistoryBuffer>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            rooms,
            history,
            metrics,
            config,
        }
    }

    /// Registers a new connection and greets it.
    ///
    /// Returns the connection handle and a receiver for outbound messages.
    pub fn register(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<MessageEnvelope>) {
        let (tx, rx) = mpsc::channel(self.config.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(tx));

        self.pool.add(handle.clone());
        connections::record_connect(&self.metrics);
        self.deliver(&handle, build_connection_established(handle.id), None);

        info!(conn_id = %handle.id, "WebSocket connection registered");

        (handle, rx)
    }

    /// Unregisters a connection and removes all of its memberships.
    /// Unknown connections are a no-op.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        let left = self.rooms.leave_all(*conn_id);
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            connections::record_disconnect(&self.metrics);

            info!(
                conn_id = %conn_id,
                rooms = left.len(),
                "WebSocket connection unregistered"
            );
        }
    }

    /// Gets a live connection or fails with `NotFound`.
    pub fn session(&self, conn_id: &ConnectionId) -> AppResult<Arc<ConnectionHandle>> {
        self.pool
            .get(conn_id)
            .ok_or_else(|| AppError::not_found(format!("Unknown connection {conn_id}")))
    }

    /// Joins a room, acknowledging with `room_joined`.
    ///
    /// For incident rooms the incident's history lock is held across the
    /// subscribe, the ack and the replay, so no live update for that
    /// incident can land between them or be missed.
    pub async fn join_room(&self, conn_id: &ConnectionId, room: RoomKey) -> AppResult<()> {
        let handle = self.session(conn_id)?;
        self.check_subscription_limit(conn_id, &room)?;

        match room.incident_room_id() {
            Some(room_id) => {
                let log = self.history.lock(room_id).await;
                self.rooms.join(room.clone(), *conn_id);
                self.deliver(&handle, build_room_joined(&room), None);
                self.deliver(&handle, build_replay(room_id, log.snapshot()), Some(&room));
                drop(log);
                rooms::record_replay(&self.metrics);
            }
            None => {
                self.rooms.join(room.clone(), *conn_id);
                self.deliver(&handle, build_room_joined(&room), None);
            }
        }

        rooms::record_join(&self.metrics);
        debug!(conn_id = %conn_id, room = %room, "Joined room");
        Ok(())
    }

    fn check_subscription_limit(&self, conn_id: &ConnectionId, room: &RoomKey) -> AppResult<()> {
        let max = self.config.max_subscriptions_per_connection;
        if !self.rooms.has_joined(*conn_id, room) && self.rooms.subscription_count(*conn_id) >= max
        {
            return Err(AppError::limit_exceeded(format!(
                "Maximum subscriptions ({max}) reached"
            )));
        }
        Ok(())
    }

    /// Declares the officer role and moves the session into its unit room.
    ///
    /// The previous unit room is left before the new one is joined, so
    /// switching units never counts twice against the subscription limit.
    pub async fn declare_officer(&self, conn_id: &ConnectionId, unit: UnitNumber) -> AppResult<()> {
        self.session(conn_id)?;
        let previous = self.pool.unit_of(conn_id).filter(|prev| *prev != unit);
        if let Some(previous) = &previous {
            self.rooms.leave(&RoomKey::Unit(previous.clone()), *conn_id);
        }

        if let Err(e) = self.join_room(conn_id, RoomKey::Unit(unit.clone())).await {
            if let Some(previous) = previous {
                self.rooms.join(RoomKey::Unit(previous), *conn_id);
            }
            return Err(e);
        }
        self.pool.declare_officer(conn_id, unit.clone())?;

        info!(conn_id = %conn_id, unit_number = %unit, "Officer declared");
        Ok(())
    }

    /// Leaves a room, acknowledging with `room_left`. Leaving a room the
    /// session is not in still acknowledges.
    pub fn leave_room(&self, conn_id: &ConnectionId, room: &RoomKey) -> AppResult<bool> {
        let handle = self.session(conn_id)?;
        let removed = self.rooms.leave(room, *conn_id);
        self.deliver(
            &handle,
            OutboundMessage::RoomLeft {
                room: room.to_room_name(),
            },
            None,
        );
        debug!(conn_id = %conn_id, room = %room, removed, "Left room");
        Ok(removed)
    }

    /// Broadcasts a message to every current subscriber of a room.
    ///
    /// Returns the number of subscribers the message was queued for.
    pub fn broadcast(&self, room: &RoomKey, message: &OutboundMessage) -> usize {
        let mut sent = 0;
        for conn_id in self.rooms.subscribers(room) {
            if let Some(handle) = self.pool.get(&conn_id) {
                if self.deliver(&handle, message.clone(), Some(room)) {
                    sent += 1;
                }
            }
        }

        debug!(room = %room, kind = message.type_name(), sent, "Broadcast");
        sent
    }

    /// Sends a message to one connection.
    pub fn send_to(&self, conn_id: &ConnectionId, message: OutboundMessage) -> bool {
        match self.pool.get(conn_id) {
            Some(handle) => self.deliver(&handle, message, None),
            None => false,
        }
    }

    fn deliver(
        &self,
        handle: &ConnectionHandle,
        message: OutboundMessage,
        room: Option<&RoomKey>,
    ) -> bool {
        match handle.send(message, room) {
            Delivery::Sent => {
                messages::record_sent_count(&self.metrics, 1);
                true
            }
            Delivery::Overflowed => {
                messages::record_dropped(&self.metrics);
                connections::record_slow_consumer(&self.metrics);
                warn!(conn_id = %handle.id, "Disconnecting slow consumer");
                self.unregister(&handle.id);
                false
            }
            Delivery::Closed => {
                messages::record_dropped(&self.metrics);
                false
            }
        }
    }

    /// Snapshot of a session's role and rooms.
    pub async fn session_info(&self, conn_id: &ConnectionId) -> Option<SessionInfo> {
        let handle = self.pool.get(conn_id)?;
        let mut rooms: Vec<String> = self
            .rooms
            .rooms_of(*conn_id)
            .iter()
            .map(RoomKey::to_room_name)
            .collect();
        rooms.sort();

        Some(SessionInfo {
            id: handle.id,
            role: self.pool.role_of(conn_id),
            rooms,
            connected_at: handle.connected_at,
            last_activity: *handle.last_activity.read().await,
            alive: handle.is_alive(),
        })
    }

    /// Snapshots of every live session, oldest first.
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let mut sessions = Vec::new();
        for handle in self.pool.all_connections() {
            if let Some(info) = self.session_info(&handle.id).await {
                sessions.push(info);
            }
        }
        sessions.sort_by_key(|info| info.connected_at);
        sessions
    }

    /// Closes all connections.
    pub fn close_all(&self) {
        let all = self.pool.all_connections();
        for conn in &all {
            self.unregister(&conn.id);
        }
        info!(count = all.len(), "All connections closed");
    }

    /// Returns the total connection count.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Returns the realtime configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Returns a reference to the room directory.
    pub fn rooms(&self) -> &Arc<RoomDirectory> {
        &self.rooms
    }
}
