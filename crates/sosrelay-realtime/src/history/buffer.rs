//! Bounded history buffer.
//!
//! Each incident room has its own [`IncidentLog`] behind an async mutex.
//! Holding the lock is how callers make "record + broadcast" and
//! "join + replay" atomic with respect to each other.
//!
//! Logs live in a moka cache and can be evicted at any time, so mutual
//! exclusion does not come from the cached mutex alone. Every lock first
//! takes one of a fixed set of stripe locks chosen by room id; stripes are
//! never evicted, so two holders of the same incident can never overlap.

use std::collections::VecDeque;
use std::hash::{BuildHasher, RandomState};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use sosrelay_core::config::HistoryConfig;

use super::LocationEvent;

/// Append-only, capped log for one incident.
#[derive(Debug)]
pub struct IncidentLog {
    events: VecDeque<LocationEvent>,
    capacity: usize,
    dropped: u64,
}

impl IncidentLog {
    /// Creates an empty log holding at most `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Appends an event, dropping the oldest when full. Returns `true` if
    /// an old event was dropped.
    pub fn push(&mut self, event: LocationEvent) -> bool {
        let evicted = if self.events.len() >= self.capacity {
            self.events.pop_front();
            self.dropped += 1;
            true
        } else {
            false
        };
        self.events.push_back(event);
        evicted
    }

    /// Copies the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<LocationEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of events currently held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the log holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events dropped because of the cap.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Discards every held event.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

const LOCK_STRIPES: usize = 64;

/// Exclusive access to one incident's log.
///
/// Holds the incident's stripe lock for as long as it lives.
#[derive(Debug)]
pub struct IncidentGuard {
    log: OwnedMutexGuard<IncidentLog>,
    _stripe: OwnedMutexGuard<()>,
}

impl Deref for IncidentGuard {
    type Target = IncidentLog;

    fn deref(&self) -> &IncidentLog {
        &self.log
    }
}

impl DerefMut for IncidentGuard {
    fn deref_mut(&mut self) -> &mut IncidentLog {
        &mut self.log
    }
}

/// Recent location history for all incidents, keyed by incident room id.
#[derive(Debug)]
pub struct HistoryBuffer {
    logs: Cache<String, Arc<Mutex<IncidentLog>>>,
    stripes: Vec<Arc<Mutex<()>>>,
    hasher: RandomState,
    max_events: usize,
}

impl HistoryBuffer {
    /// Creates a buffer bounded by `config`.
    pub fn new(config: &HistoryConfig) -> Self {
        let logs = Cache::builder()
            .max_capacity(config.max_incidents)
            .time_to_idle(Duration::from_secs(config.idle_ttl_seconds))
            .build();

        Self {
            logs,
            stripes: (0..LOCK_STRIPES).map(|_| Arc::new(Mutex::new(()))).collect(),
            hasher: RandomState::new(),
            max_events: config.max_events_per_incident,
        }
    }

    fn log_for(&self, room_id: &str) -> Arc<Mutex<IncidentLog>> {
        let max_events = self.max_events;
        self.logs.get_with(room_id.to_string(), || {
            Arc::new(Mutex::new(IncidentLog::new(max_events)))
        })
    }

    fn stripe_for(&self, room_id: &str) -> Arc<Mutex<()>> {
        let index = (self.hasher.hash_one(room_id) as usize) % self.stripes.len();
        self.stripes[index].clone()
    }

    /// Locks an incident's log, creating it if needed.
    ///
    /// The log is looked up only after the stripe is held, so a holder
    /// always sees the log the previous holder left in the cache.
    pub async fn lock(&self, room_id: &str) -> IncidentGuard {
        let stripe = self.stripe_for(room_id).lock_owned().await;
        let log = self.log_for(room_id).lock_owned().await;
        IncidentGuard {
            log,
            _stripe: stripe,
        }
    }

    /// Appends a location to an incident's log.
    pub async fn record(&self, room_id: &str, event: LocationEvent) {
        let mut log = self.lock(room_id).await;
        if log.push(event) {
            debug!(room_id = %room_id, "History cap reached, dropped oldest location");
        }
    }

    /// Snapshot of an incident's log in insertion order; empty when
    /// nothing was recorded.
    pub async fn replay(&self, room_id: &str) -> Vec<LocationEvent> {
        match self.logs.get(room_id) {
            Some(log) => log.lock().await.snapshot(),
            None => Vec::new(),
        }
    }

    /// Empties and drops an incident's log.
    ///
    /// Waits for any current holder, so a join in progress finishes its
    /// replay before the log disappears.
    pub async fn evict(&self, room_id: &str) {
        let log = self.lock(room_id).await;
        self.evict_locked(room_id, log);
    }

    /// Empties and drops an incident's log the caller already holds.
    pub fn evict_locked(&self, room_id: &str, mut log: IncidentGuard) {
        log.clear();
        self.logs.invalidate(room_id);
        drop(log);
        debug!(room_id = %room_id, "Incident history evicted");
    }

    /// Number of incident logs currently held.
    pub fn incident_count(&self) -> u64 {
        self.logs.run_pending_tasks();
        self.logs.entry_count()
    }
}
