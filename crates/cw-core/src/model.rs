//! Call lifecycle data model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque call identifier, stable for the lifetime of one call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(String);

impl CallId {
    /// Create a call identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CallId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle phase of a tracked call.
///
/// `Detected` is transient: a call is detected and immediately stored as
/// `Active`. `Ended` records are removed as soon as their terminal action is
/// produced, so the store only ever holds `Active` records between snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPhase {
    /// First observation, before the record is materialized.
    Detected,
    /// Call is up and tracked.
    Active,
    /// Terminal phase.
    Ended,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detected => write!(f, "detected"),
            Self::Active => write!(f, "active"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// A tracked call, owned by the [`CallStore`](crate::CallStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Call identifier.
    pub id: CallId,
    /// Caller-facing number (mask before display).
    pub subscriber_id: String,
    /// Region derived from the termination descriptor.
    pub region: String,
    /// Last known elapsed duration in seconds.
    pub duration_seconds: u64,
    /// Lifecycle phase.
    pub phase: CallPhase,
}

impl CallRecord {
    /// Immutable copy of the data an action needs.
    #[must_use]
    pub fn summary(&self) -> CallSummary {
        CallSummary {
            id: self.id.clone(),
            subscriber_id: self.subscriber_id.clone(),
            region: self.region.clone(),
            duration_seconds: self.duration_seconds,
        }
    }
}

/// Detached view of a call carried by an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSummary {
    /// Call identifier.
    pub id: CallId,
    /// Caller-facing number (unmasked).
    pub subscriber_id: String,
    /// Derived region.
    pub region: String,
    /// Duration at the time the action was produced.
    pub duration_seconds: u64,
}

/// Side-effecting work derived from a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// A new call was detected.
    Notify {
        /// The detected call.
        call: CallSummary,
    },
    /// A call ended; fetch and upload its recording.
    Retrieve {
        /// The ended call.
        call: CallSummary,
        /// Final duration in seconds.
        final_duration: u64,
    },
}

impl Action {
    /// The call this action refers to.
    #[must_use]
    pub const fn call(&self) -> &CallSummary {
        match self {
            Self::Notify { call } | Self::Retrieve { call, .. } => call,
        }
    }

    /// Short action name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Notify { .. } => "notify",
            Self::Retrieve { .. } => "retrieve",
        }
    }

    /// Returns true for [`Action::Notify`].
    #[must_use]
    pub const fn is_notify(&self) -> bool {
        matches!(self, Self::Notify { .. })
    }

    /// Returns true for [`Action::Retrieve`].
    #[must_use]
    pub const fn is_retrieve(&self) -> bool {
        matches!(self, Self::Retrieve { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CallRecord {
        CallRecord {
            id: CallId::new("A1"),
            subscriber_id: "85512345649".into(),
            region: "CAMBODIA".into(),
            duration_seconds: 12,
            phase: CallPhase::Active,
        }
    }

    #[test]
    fn summary_copies_fields() {
        let summary = record().summary();
        assert_eq!(summary.id.as_str(), "A1");
        assert_eq!(summary.subscriber_id, "85512345649");
        assert_eq!(summary.region, "CAMBODIA");
        assert_eq!(summary.duration_seconds, 12);
    }

    #[test]
    fn action_accessors() {
        let notify = Action::Notify {
            call: record().summary(),
        };
        assert!(notify.is_notify());
        assert_eq!(notify.kind(), "notify");

        let retrieve = Action::Retrieve {
            call: record().summary(),
            final_duration: 40,
        };
        assert!(retrieve.is_retrieve());
        assert_eq!(retrieve.kind(), "retrieve");
        assert_eq!(retrieve.call().id, CallId::from("A1"));
    }

    #[test]
    fn action_serializes_with_kind_tag() {
        let action = Action::Retrieve {
            call: record().summary(),
            final_duration: 40,
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["kind"], "retrieve");
        assert_eq!(value["final_duration"], 40);
        assert_eq!(value["call"]["id"], "A1");
    }

    #[test]
    fn phase_display() {
        assert_eq!(CallPhase::Active.to_string(), "active");
        assert_eq!(CallPhase::Ended.to_string(), "ended");
    }
}
