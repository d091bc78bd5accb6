//! Top-level real-time engine that ties together all subsystems.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use validator::Validate;

use sosrelay_core::AppResult;
use sosrelay_core::config::AppConfig;
use sosrelay_core::error::AppError;
use sosrelay_core::types::{ConnectionId, UnitNumber};

use crate::bridge::event_bridge::{EventBridge, IngressReceipt};
use crate::bridge::ingress::IngressEvent;
use crate::bridge::relay::{RecordClient, RecordRelay, record_client};
use crate::connection::heartbeat::HeartbeatConfig;
use crate::connection::manager::ConnectionManager;
use crate::history::HistoryBuffer;
use crate::message::builder::build_error;
use crate::message::serializer::deserialize_inbound;
use crate::message::types::{InboundMessage, OfficerLocation, OutboundMessage};
use crate::message::validator::{identifier, require_identifier, validate_inbound};
use crate::metrics::{EngineMetrics, MetricsSnapshot, messages};
use crate::room::{RoomDirectory, RoomKey};

/// Point-in-time view of hub state.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    /// Live connections.
    pub connections: usize,
    /// Non-empty rooms.
    pub rooms: usize,
    /// Incidents with a history buffer.
    pub incidents_tracked: u64,
    /// Incidents with an assigned unit.
    pub assignments: usize,
    /// Counters.
    pub metrics: MetricsSnapshot,
}

/// Central real-time engine that coordinates all WebSocket subsystems.
#[derive(Clone)]
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Room directory.
    pub rooms: Arc<RoomDirectory>,
    /// Per-incident location history.
    pub history: Arc<HistoryBuffer>,
    /// Ingress adapter (system-of-record events → rooms).
    pub ingress: Arc<EventBridge>,
    /// Record relay (client actions → system-of-record).
    pub relay: Arc<RecordRelay>,
    /// Metrics collector.
    pub metrics: Arc<EngineMetrics>,
    /// Max accepted inbound frame size.
    max_message_size: usize,
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}

impl RealtimeEngine {
    /// Creates a new real-time engine with all subsystems.
    pub fn new(config: &AppConfig) -> AppResult<Self> {
        let client = record_client(&config.relay)?;
        Ok(Self::with_record_client(config, client))
    }

    /// Creates an engine that relays through the given record client.
    pub fn with_record_client(config: &AppConfig, client: Arc<dyn RecordClient>) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        let rooms = Arc::new(RoomDirectory::new());
        let history = Arc::new(HistoryBuffer::new(&config.history));
        let connections = Arc::new(ConnectionManager::new(
            config.realtime.clone(),
            rooms.clone(),
            history.clone(),
            metrics.clone(),
        ));
        let ingress = Arc::new(EventBridge::new(
            connections.clone(),
            history.clone(),
            metrics.clone(),
            &config.history,
        ));
        let relay = Arc::new(RecordRelay::new(client, metrics.clone()));

        info!(
            relay_configured = config.relay.record_api_url.is_some(),
            "Real-time engine initialized"
        );

        Self {
            connections,
            rooms,
            history,
            ingress,
            relay,
            metrics,
            max_message_size: config.realtime.max_message_size,
        }
    }

    /// Processes one inbound text frame from a client.
    ///
    /// Failures are reported to that client as an `error` frame; the
    /// connection stays open.
    pub async fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.connections.pool().get(conn_id) else {
            warn!(conn_id = %conn_id, "Message from unknown connection");
            return;
        };

        handle.touch().await;
        messages::record_received(&self.metrics);

        if let Err(e) = self.dispatch(conn_id, raw).await {
            if e.is_client_error() {
                debug!(conn_id = %conn_id, error = %e, "Inbound message rejected");
            } else {
                warn!(conn_id = %conn_id, error = %e, "Inbound message failed");
            }
            self.connections.send_to(conn_id, build_error(&e));
        }
    }

    async fn dispatch(&self, conn_id: &ConnectionId, raw: &str) -> AppResult<()> {
        validate_inbound(raw, self.max_message_size)?;

        match deserialize_inbound(raw)? {
            InboundMessage::JoinSosRoom { room_id } => {
                let room_id = require_identifier(room_id.as_ref(), "Room ID is required")?;
                let room = RoomKey::incident(&room_id)
                    .ok_or_else(|| AppError::validation(format!("Invalid room ID: {room_id}")))?;
                self.connections.join_room(conn_id, room).await
            }
            InboundMessage::JoinOfficerRoom { unit_number } => {
                let unit = identifier(unit_number.as_ref())
                    .and_then(|raw| UnitNumber::parse(&raw))
                    .ok_or_else(|| AppError::validation("Unit number is required"))?;
                self.connections.declare_officer(conn_id, unit).await
            }
            InboundMessage::JoinSosChannel {} => {
                self.connections
                    .join_room(conn_id, RoomKey::IncidentChannel)
                    .await
            }
            InboundMessage::JoinLocationTrackingChannel {} => {
                self.connections
                    .join_room(conn_id, RoomKey::TrackingChannel)
                    .await
            }
            InboundMessage::LeaveRoom { room } => {
                let key = RoomKey::parse(&room)
                    .ok_or_else(|| AppError::validation(format!("Unknown room: {room}")))?;
                self.connections.leave_room(conn_id, &key)?;
                Ok(())
            }
            InboundMessage::OfficerLocationUpdate(location) => {
                self.forward_officer_location(conn_id, location)
            }
            InboundMessage::CreateSos { fields } => {
                let response = self.relay.create_sos(fields).await;
                self.connections
                    .send_to(conn_id, OutboundMessage::CreateSosResponse(response));
                Ok(())
            }
            InboundMessage::UpdateLocation { fields } => {
                let response = self.relay.update_location(fields).await;
                self.connections
                    .send_to(conn_id, OutboundMessage::UpdateLocationResponse(response));
                Ok(())
            }
            InboundMessage::Ingress { event } => {
                let reply = match self.ingest_value(event).await {
                    Ok(receipt) => OutboundMessage::IngressResponse {
                        success: true,
                        kind: Some(receipt.kind),
                        deliveries: Some(receipt.deliveries),
                        error: None,
                    },
                    Err(e) => OutboundMessage::IngressResponse {
                        success: false,
                        kind: None,
                        deliveries: None,
                        error: Some(e.message),
                    },
                };
                self.connections.send_to(conn_id, reply);
                Ok(())
            }
            InboundMessage::Pong { .. } => {
                self.connections.session(conn_id)?.record_pong().await;
                Ok(())
            }
        }
    }

    fn forward_officer_location(
        &self,
        conn_id: &ConnectionId,
        location: OfficerLocation,
    ) -> AppResult<()> {
        location.validate()?;
        let unit_number = identifier(location.unit_number.as_ref())
            .and_then(|raw| UnitNumber::parse(&raw))
            .or_else(|| self.connections.pool().unit_of(conn_id));

        let msg = OutboundMessage::UnitLoc {
            unit_number,
            latitude: location.latitude,
            longitude: location.longitude,
            timestamp: Utc::now(),
        };
        self.connections.broadcast(&RoomKey::TrackingChannel, &msg);
        Ok(())
    }

    /// Ingests a system-of-record event.
    pub async fn ingest(&self, event: IngressEvent) -> AppResult<IngressReceipt> {
        self.ingress.ingest(event).await
    }

    /// Ingests a raw `{kind, payload}` envelope.
    pub async fn ingest_value(&self, raw: Value) -> AppResult<IngressReceipt> {
        self.ingress.ingest_value(raw).await
    }

    /// Heartbeat timings for new connections.
    pub fn heartbeat_config(&self) -> HeartbeatConfig {
        HeartbeatConfig::from(self.connections.config())
    }

    /// Point-in-time stats.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            connections: self.connections.connection_count(),
            rooms: self.rooms.room_count(),
            incidents_tracked: self.history.incident_count(),
            assignments: self.ingress.assignment_count(),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Initiates a graceful shutdown of the real-time engine.
    pub async fn shutdown(&self) -> AppResult<()> {
        info!("Shutting down real-time engine");
        self.connections.close_all();

        info!("Real-time engine shut down");
        Ok(())
    }
}
