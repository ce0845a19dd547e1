//! Reconciliation engine.
//!
//! Applies one snapshot at a time to a [`CallStore`] and returns the actions
//! produced by the resulting lifecycle transitions. Within a snapshot the
//! order is fixed: active section, then ended section, then pruning.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::display::{mask_subscriber, region_from_termination};
use crate::model::{Action, CallId, CallPhase, CallRecord};
use crate::normalize::{NormalizedSnapshot, normalize};
use crate::store::CallStore;

/// Maximum number of payload characters carried in a rejection log.
pub const EXCERPT_CHARS: usize = 200;

/// Counters for one engine instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Snapshots applied.
    pub snapshots_applied: u64,
    /// Snapshots rejected as malformed.
    pub snapshots_rejected: u64,
    /// Notify actions produced.
    pub notified: u64,
    /// Retrieve actions produced.
    pub retrieved: u64,
    /// Records pruned without an end notice.
    pub pruned: u64,
}

/// Owns the call store for one feed session.
#[derive(Debug, Default)]
pub struct ReconcileEngine {
    store: CallStore,
    stats: EngineStats,
}

impl ReconcileEngine {
    /// Create an engine with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the store.
    #[must_use]
    pub const fn store(&self) -> &CallStore {
        &self.store
    }

    /// Current counters.
    #[must_use]
    pub const fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Normalize and apply a raw payload.
    ///
    /// A malformed payload is logged with a truncated excerpt and produces no
    /// actions; the store is left untouched.
    pub fn apply_payload(&mut self, payload: &Value) -> Vec<Action> {
        match normalize(payload) {
            Ok(snapshot) => self.apply(&snapshot),
            Err(e) => {
                self.stats.snapshots_rejected += 1;
                warn!(
                    error = %e,
                    excerpt = %payload_excerpt(payload),
                    "Ignoring malformed snapshot"
                );
                Vec::new()
            }
        }
    }

    /// Apply a normalized snapshot.
    pub fn apply(&mut self, snapshot: &NormalizedSnapshot) -> Vec<Action> {
        let mut actions = Vec::new();
        let seen: HashSet<&CallId> = snapshot.active.iter().map(|e| &e.id).collect();

        for entry in snapshot.active.iter().filter(|e| e.is_up()) {
            if self.store.is_notified(&entry.id) {
                // Missing or non-numeric durations count as zero, same as on first sight.
                self.store.refresh_duration(&entry.id, entry.duration.unwrap_or(0));
                continue;
            }

            let record = CallRecord {
                id: entry.id.clone(),
                subscriber_id: entry.subscriber_id.clone(),
                region: region_from_termination(&entry.termination),
                duration_seconds: entry.duration.unwrap_or(0),
                phase: CallPhase::Detected,
            };
            info!(
                call_id = %record.id,
                subscriber = %mask_subscriber(&record.subscriber_id),
                region = %record.region,
                duration = record.duration_seconds,
                "New call detected"
            );
            debug!(call_id = %record.id, subscriber = %record.subscriber_id, "Caller id");
            actions.push(Action::Notify {
                call: record.summary(),
            });
            self.store.activate(record);
            self.stats.notified += 1;
        }

        for entry in &snapshot.ended {
            let Some(mut record) = self.store.remove(&entry.id) else {
                debug!(call_id = %entry.id, "End notice for untracked call");
                continue;
            };
            record.phase = CallPhase::Ended;
            let final_duration = entry.duration.unwrap_or(record.duration_seconds);
            info!(
                call_id = %record.id,
                subscriber = %mask_subscriber(&record.subscriber_id),
                final_duration,
                "Call ended, scheduling retrieval"
            );
            actions.push(Action::Retrieve {
                call: record.summary(),
                final_duration,
            });
            self.stats.retrieved += 1;
        }

        let pruned = self.store.retain_seen(&seen);
        for id in &pruned {
            info!(call_id = %id, "Pruning stale call without end notice");
        }
        self.stats.pruned += pruned.len() as u64;
        self.stats.snapshots_applied += 1;

        actions
    }
}

/// At most [`EXCERPT_CHARS`] characters of the serialized payload.
#[must_use]
pub fn payload_excerpt(payload: &Value) -> String {
    text_excerpt(&payload.to_string())
}

/// At most [`EXCERPT_CHARS`] characters of a raw frame, with `…` when cut.
#[must_use]
pub fn text_excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
