//! In-memory call state store.

use std::collections::{HashMap, HashSet};

use crate::model::{CallId, CallPhase, CallRecord};

/// Lifecycle table keyed by call id, plus the set of ids already notified.
///
/// The store is owned by a single reconciliation path and is not shared
/// across tasks.
#[derive(Debug, Default)]
pub struct CallStore {
    records: HashMap<CallId, CallRecord>,
    notified: HashSet<CallId>,
}

impl CallStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, id: &CallId) -> Option<&CallRecord> {
        self.records.get(id)
    }

    /// Returns true when a record exists for `id`.
    #[must_use]
    pub fn contains(&self, id: &CallId) -> bool {
        self.records.contains_key(id)
    }

    /// Returns true when `id` has already produced a notification.
    #[must_use]
    pub fn is_notified(&self, id: &CallId) -> bool {
        self.notified.contains(id)
    }

    /// Insert an active record and mark it notified. Replaces any existing record.
    pub fn activate(&mut self, mut record: CallRecord) {
        record.phase = CallPhase::Active;
        self.notified.insert(record.id.clone());
        self.records.insert(record.id.clone(), record);
    }

    /// Refresh the duration of an existing record. Returns false when absent.
    pub fn refresh_duration(&mut self, id: &CallId, seconds: u64) -> bool {
        match self.records.get_mut(id) {
            Some(record) => {
                record.duration_seconds = seconds;
                true
            }
            None => false,
        }
    }

    /// Remove a record and clear its notified mark.
    pub fn remove(&mut self, id: &CallId) -> Option<CallRecord> {
        self.notified.remove(id);
        self.records.remove(id)
    }

    /// Remove every record whose id is not in `seen`, returning the removed ids.
    pub fn retain_seen(&mut self, seen: &HashSet<&CallId>) -> Vec<CallId> {
        let stale: Vec<CallId> = self
            .records
            .keys()
            .filter(|id| !seen.contains(id))
            .cloned()
            .collect();
        for id in &stale {
            self.remove(id);
        }
        stale
    }

    /// Number of tracked records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true when no record is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of ids currently marked notified.
    #[must_use]
    pub fn notified_len(&self) -> usize {
        self.notified.len()
    }

    /// Iterate over tracked records.
    pub fn records(&self) -> impl Iterator<Item = &CallRecord> {
        self.records.values()
    }
}
