//! Connection pool: the session registry.
//!
//! Tracks every live connection and, for sessions that declared the
//! officer role, which unit they belong to.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;

use sosrelay_core::error::AppError;
use sosrelay_core::types::{ConnectionId, UnitNumber};
use sosrelay_core::AppResult;

use super::handle::{ConnectionHandle, SessionRole};

/// Thread-safe pool of all active WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection ID → connection handle for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// Unit number → officer sessions of that unit.
    by_unit: DashMap<UnitNumber, HashSet<ConnectionId>>,
    /// Connection ID → declared unit.
    unit_of: DashMap<ConnectionId, UnitNumber>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection and its officer registration. Unknown IDs are
    /// a no-op.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        if let Some((_, unit)) = self.unit_of.remove(conn_id) {
            self.detach_officer(&unit, conn_id);
        }
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Declares a session an officer of `unit`.
    ///
    /// Returns the unit the session was previously listed under, if it
    /// moved.
    pub fn declare_officer(
        &self,
        conn_id: &ConnectionId,
        unit: UnitNumber,
    ) -> AppResult<Option<UnitNumber>> {
        if !self.by_id.contains_key(conn_id) {
            return Err(AppError::not_found(format!("Unknown connection {conn_id}")));
        }

        let previous = self
            .unit_of
            .insert(*conn_id, unit.clone())
            .filter(|prev| *prev != unit);
        if let Some(prev) = &previous {
            self.detach_officer(prev, conn_id);
        }
        self.by_unit.entry(unit).or_default().insert(*conn_id);

        Ok(previous)
    }

    fn detach_officer(&self, unit: &UnitNumber, conn_id: &ConnectionId) {
        if let Some(mut sessions) = self.by_unit.get_mut(unit) {
            sessions.remove(conn_id);
        }
        self.by_unit.remove_if(unit, |_, sessions| sessions.is_empty());
    }

    /// Unit a session declared, if any.
    pub fn unit_of(&self, conn_id: &ConnectionId) -> Option<UnitNumber> {
        self.unit_of.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Declared role of a session.
    pub fn role_of(&self, conn_id: &ConnectionId) -> SessionRole {
        match self.unit_of(conn_id) {
            Some(unit_number) => SessionRole::Officer { unit_number },
            None => SessionRole::Unspecified,
        }
    }

    /// Officer sessions registered under a unit.
    pub fn officers_of(&self, unit: &UnitNumber) -> Vec<ConnectionId> {
        self.by_unit
            .get(unit)
            .map(|entry| entry.value().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns total number of active connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns the number of units with at least one officer connected.
    pub fn unit_count(&self) -> usize {
        self.by_unit.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
