//! Ingress event → room broadcast mapping.
//!
//! Every transport (HTTP, WebSocket `ingress` frame, in-process call)
//! funnels into [`EventBridge::ingest`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use sosrelay_core::AppResult;
use sosrelay_core::config::HistoryConfig;
use sosrelay_core::error::{AppError, ErrorKind};
use sosrelay_core::types::{IncidentId, UnitNumber};

use crate::connection::manager::ConnectionManager;
use crate::history::{HistoryBuffer, LocationEvent};
use crate::message::builder::build_live_location;
use crate::message::types::OutboundMessage;
use crate::metrics::{EngineMetrics, ingress};
use crate::room::RoomKey;

use super::assignment::UnitAssignments;
use super::ingress::{
    IncidentCreated, IncidentResolved, IngressEvent, LocationUpdated, OfficerAssigned,
    UnitLocationUpdated,
};

/// What an accepted ingress event did.
#[derive(Debug, Clone, Serialize)]
pub struct IngressReceipt {
    /// Event kind.
    pub kind: String,
    /// Rooms broadcast to, in order.
    pub rooms: Vec<String>,
    /// Total messages queued across those rooms.
    pub deliveries: usize,
}

impl IngressReceipt {
    fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            rooms: Vec::new(),
            deliveries: 0,
        }
    }

    fn push(&mut self, room: &RoomKey, sent: usize) {
        self.rooms.push(room.to_room_name());
        self.deliveries += sent;
    }
}

/// Bridges system-of-record events into room broadcasts.
#[derive(Debug)]
pub struct EventBridge {
    /// Connection manager
    connections: Arc<ConnectionManager>,
    /// Incident history
    history: Arc<HistoryBuffer>,
    /// Incident → unit assignments
    assignments: UnitAssignments,
    /// Metrics
    metrics: Arc<EngineMetrics>,
}

impl EventBridge {
    /// Create a new event bridge
    pub fn new(
        connections: Arc<ConnectionManager>,
        history: Arc<HistoryBuffer>,
        metrics: Arc<EngineMetrics>,
        config: &HistoryConfig,
    ) -> Self {
        Self {
            connections,
            history,
            assignments: UnitAssignments::new(config),
            metrics,
        }
    }

    /// Parses a raw `{kind, payload}` envelope and ingests it.
    pub async fn ingest_value(&self, raw: Value) -> AppResult<IngressReceipt> {
        let event: IngressEvent = match serde_json::from_value(raw) {
            Ok(event) => event,
            Err(e) => {
                ingress::record_rejected(&self.metrics);
                warn!(error = %e, "Rejected malformed ingress event");
                return Err(AppError::with_source(
                    ErrorKind::Validation,
                    format!("Malformed ingress event: {e}"),
                    e,
                ));
            }
        };
        self.ingest(event).await
    }

    /// Validates and applies an ingress event.
    ///
    /// Invalid events are rejected before any state changes or broadcasts.
    pub async fn ingest(&self, event: IngressEvent) -> AppResult<IngressReceipt> {
        if let Err(e) = event.validate() {
            ingress::record_rejected(&self.metrics);
            let err = AppError::from(e);
            warn!(kind = event.kind(), error = %err.message, "Rejected invalid ingress event");
            return Err(err);
        }

        let mut receipt = IngressReceipt::new(event.kind());
        let sos_id = event.sos_id();
        match event {
            IngressEvent::IncidentCreated(e) => self.on_incident_created(e, &mut receipt),
            IngressEvent::LocationUpdated(e) => self.on_location_updated(e, &mut receipt).await,
            IngressEvent::UnitLocationUpdated(e) => self.on_unit_location_updated(e, &mut receipt),
            IngressEvent::OfficerAssigned(e) => self.on_officer_assigned(e, &mut receipt),
            IngressEvent::IncidentResolved(e) => self.on_incident_resolved(e, &mut receipt).await,
        }

        ingress::record_accepted(&self.metrics);
        info!(
            kind = %receipt.kind,
            sos_id = %sos_id,
            deliveries = receipt.deliveries,
            "Ingress event applied"
        );
        Ok(receipt)
    }

    fn on_incident_created(&self, e: IncidentCreated, receipt: &mut IngressReceipt) {
        let msg = OutboundMessage::NewSos {
            sos_id: e.sos_id,
            room_id: e.room_id(),
            name: e.name,
            sos_type: e.sos_type,
            latitude: e.latitude,
            longitude: e.longitude,
            created_at: e.created_at.unwrap_or_else(Utc::now),
        };
        self.broadcast(RoomKey::IncidentChannel, &msg, receipt);
    }

    async fn on_location_updated(&self, e: LocationUpdated, receipt: &mut IngressReceipt) {
        let room_id = e.room_id();
        let timestamp = e.timestamp.unwrap_or_else(Utc::now);
        let unit = e
            .unit_number
            .clone()
            .or_else(|| self.assignments.get(e.sos_id));
        let event = LocationEvent {
            sos_id: e.sos_id,
            latitude: e.latitude,
            longitude: e.longitude,
            timestamp,
            unit_number: unit.clone(),
        };

        {
            // Held across record + broadcast so a concurrent join sees
            // this event either in its replay or live, exactly once.
            let mut log = self.history.lock(&room_id).await;
            if log.push(event.clone()) {
                debug!(room_id = %room_id, "History cap reached, dropped oldest location");
            }
            self.broadcast(
                RoomKey::Incident(room_id.clone()),
                &build_live_location(&room_id, event),
                receipt,
            );
        }

        if let Some(unit) = unit {
            self.fan_out_to_unit(unit, e.sos_id, e.latitude, e.longitude, timestamp, receipt);
        }
    }

    fn on_unit_location_updated(&self, e: UnitLocationUpdated, receipt: &mut IngressReceipt) {
        let timestamp = e.timestamp.unwrap_or_else(Utc::now);
        self.fan_out_to_unit(
            e.unit_number,
            e.sos_id,
            e.latitude,
            e.longitude,
            timestamp,
            receipt,
        );
    }

    fn fan_out_to_unit(
        &self,
        unit: UnitNumber,
        sos_id: IncidentId,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        receipt: &mut IngressReceipt,
    ) {
        let to_unit = OutboundMessage::UnitLocationUpdate {
            sos_id,
            latitude,
            longitude,
            timestamp,
        };
        self.broadcast(RoomKey::Unit(unit.clone()), &to_unit, receipt);

        let to_tracking = OutboundMessage::LocationTrackingUpdate {
            unit_number: unit,
            sos_id,
            latitude,
            longitude,
            timestamp,
        };
        self.broadcast(RoomKey::TrackingChannel, &to_tracking, receipt);
    }

    fn on_officer_assigned(&self, e: OfficerAssigned, receipt: &mut IngressReceipt) {
        let room_id = e.room_id();
        if let Some(previous) = self.assignments.assign(e.sos_id, e.unit_number.clone()) {
            debug!(sos_id = %e.sos_id, previous = %previous, "Incident reassigned");
        }

        let msg = OutboundMessage::OfficerAssigned {
            sos_id: e.sos_id,
            room_id: room_id.clone(),
            unit_number: e.unit_number.clone(),
            officer_name: e.officer_name,
        };
        self.broadcast(RoomKey::Incident(room_id), &msg, receipt);
        self.broadcast(RoomKey::Unit(e.unit_number), &msg, receipt);
    }

    async fn on_incident_resolved(&self, e: IncidentResolved, receipt: &mut IngressReceipt) {
        let room_id = e.room_id();
        let msg = OutboundMessage::IncidentResolved {
            sos_id: e.sos_id,
            room_id: room_id.clone(),
        };

        // A concurrent join either sees the resolve live or replays the
        // emptied log, never the stale history without the resolve.
        let log = self.history.lock(&room_id).await;
        self.broadcast(RoomKey::Incident(room_id.clone()), &msg, receipt);
        self.history.evict_locked(&room_id, log);

        self.broadcast(RoomKey::IncidentChannel, &msg, receipt);
        self.assignments.clear(e.sos_id);
    }

    fn broadcast(&self, room: RoomKey, msg: &OutboundMessage, receipt: &mut IngressReceipt) {
        let sent = self.connections.broadcast(&room, msg);
        receipt.push(&room, sent);
    }

    /// Unit currently assigned to an incident.
    pub fn assigned_unit(&self, sos_id: IncidentId) -> Option<UnitNumber> {
        self.assignments.get(sos_id)
    }

    /// Number of incidents with an assigned unit.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}
