//! Latest status per room.
//!
//! The store is written by the refresh scheduler and read by the query
//! endpoint. Each write replaces one room's record; readers never see a
//! partially written record, but may see a mix of rooms from the current and
//! previous cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use roomstatus_core::{RoomId, StatusRecord};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, trace};

/// A stored record and when it was written.
#[derive(Debug, Clone)]
pub struct StatusEntry {
    /// The room's latest status.
    pub record: StatusRecord,
    /// Wall-clock time of the write.
    pub updated_at: DateTime<Utc>,
    /// Monotonic time of the write, for age checks.
    written: Instant,
}

impl StatusEntry {
    fn new(record: StatusRecord) -> Self {
        Self {
            record,
            updated_at: Utc::now(),
            written: Instant::now(),
        }
    }

    /// Returns how long ago the record was written.
    pub fn age(&self) -> Duration {
        self.written.elapsed()
    }

    /// Returns true if the record is older than `period`.
    pub fn is_stale(&self, period: Duration) -> bool {
        self.age() > period
    }
}

/// Shared map from room identifier to its latest status.
///
/// Cloning is cheap; every clone refers to the same map.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityStore {
    entries: Arc<RwLock<HashMap<RoomId, StatusEntry>>>,
}

impl AvailabilityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `id`, or the unknown-room sentinel.
    pub async fn get(&self, id: &RoomId) -> StatusRecord {
        self.try_get(id)
            .await
            .unwrap_or_else(StatusRecord::unknown_room)
    }

    /// Returns the record for `id`, if one has been written.
    pub async fn try_get(&self, id: &RoomId) -> Option<StatusRecord> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|entry| entry.record.clone())
    }

    /// Returns the record for `id` together with its write time.
    pub async fn entry(&self, id: &RoomId) -> Option<StatusEntry> {
        self.entries.read().await.get(id).cloned()
    }

    /// Replaces the record for `id`.
    pub async fn set(&self, id: RoomId, record: StatusRecord) {
        trace!(room = %id, state = %record.state, "Storing room status");
        self.entries
            .write()
            .await
            .insert(id, StatusEntry::new(record));
    }

    /// Renders the three-line status for a raw device identifier.
    ///
    /// The identifier is normalized first, so lookups are case-insensitive.
    /// Unknown identifiers render the sentinel record.
    pub async fn lookup(&self, raw_id: &str) -> String {
        let id = RoomId::new(raw_id);
        let record = self.get(&id).await;
        if record.is_unknown_room() {
            debug!(room = %id, "Lookup for unknown room");
        }
        record.render()
    }

    /// Returns the number of rooms with a stored record.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no record has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
