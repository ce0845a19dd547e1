//! Property tests over random snapshot sequences.

use std::collections::HashMap;

use cw_core::{Action, ActiveEntry, CallId, EndedEntry, NormalizedSnapshot, ReconcileEngine};
use proptest::prelude::*;

const IDS: &[&str] = &["a", "b", "c", "d"];

fn active_entry() -> impl Strategy<Value = ActiveEntry> {
    (
        prop::sample::select(IDS),
        prop::bool::weighted(0.8),
        prop::option::of(0u64..600),
    )
        .prop_map(|(id, is_up, duration)| ActiveEntry {
            id: CallId::new(id),
            status: if is_up { "up".into() } else { "ringing".into() },
            duration,
            subscriber_id: "5551234567".into(),
            termination: "France Mobile".into(),
        })
}

fn ended_entry() -> impl Strategy<Value = EndedEntry> {
    (prop::sample::select(IDS), prop::option::of(0u64..600)).prop_map(|(id, duration)| {
        EndedEntry {
            id: CallId::new(id),
            duration,
        }
    })
}

fn snapshot() -> impl Strategy<Value = NormalizedSnapshot> {
    (
        prop::collection::vec(active_entry(), 0..6),
        prop::collection::vec(ended_entry(), 0..3),
    )
        .prop_map(|(active, ended)| NormalizedSnapshot { active, ended })
}

proptest! {
    #[test]
    fn every_retrieve_follows_an_open_notify(snapshots in prop::collection::vec(snapshot(), 1..25)) {
        let mut engine = ReconcileEngine::new();
        // Open episodes: notified and not yet retrieved or pruned.
        let mut open: HashMap<CallId, bool> = HashMap::new();

        for snap in &snapshots {
            for action in engine.apply(snap) {
                match action {
                    Action::Notify { call } => {
                        prop_assert!(!open.get(&call.id).copied().unwrap_or(false));
                        open.insert(call.id, true);
                    }
                    Action::Retrieve { call, .. } => {
                        prop_assert_eq!(open.get(&call.id).copied(), Some(true));
                        open.insert(call.id, false);
                    }
                }
            }
            // Anything no longer in the store has closed its episode.
            for (id, is_open) in &mut open {
                if !engine.store().contains(id) {
                    *is_open = false;
                }
            }
        }
    }

    #[test]
    fn repeating_a_snapshot_without_end_section_is_silent(mut snap in snapshot(), prior in prop::collection::vec(snapshot(), 0..5)) {
        snap.ended.clear();
        let mut engine = ReconcileEngine::new();
        for p in &prior {
            engine.apply(p);
        }
        engine.apply(&snap);
        prop_assert!(engine.apply(&snap).is_empty());
    }

    #[test]
    fn store_only_holds_ids_seen_in_latest_active_section(snapshots in prop::collection::vec(snapshot(), 1..15)) {
        let mut engine = ReconcileEngine::new();
        for snap in &snapshots {
            engine.apply(snap);
            for record in engine.store().records() {
                prop_assert!(snap.active.iter().any(|e| e.id == record.id));
                prop_assert!(engine.store().is_notified(&record.id));
            }
            prop_assert_eq!(engine.store().len(), engine.store().notified_len());
        }
    }
}
