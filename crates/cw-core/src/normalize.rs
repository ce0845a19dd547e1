//! Snapshot normalization.
//!
//! Feed snapshots look like:
//!
//! ```json
//! {
//!   "calls": {
//!     "calls": [ { "k1": {"uuid": "...", "status": "up", ...} }, [ {...}, {...} ] ],
//!     "end":   [ {"uuid": "...", "duration": 35} ]
//!   }
//! }
//! ```
//!
//! Each page of `calls.calls` is either a map of calls (values are used) or a
//! list of calls. [`normalize`] flattens both into [`ActiveEntry`] values in
//! feed order.

use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::model::CallId;

/// Status value marking a call as connected.
pub const STATUS_UP: &str = "up";

/// Caller id used when the feed omits one.
pub const UNKNOWN_SUBSCRIBER: &str = "Unknown";

/// Termination descriptor used when the feed omits one.
pub const UNKNOWN_TERMINATION: &str = "UNKNOWN";

/// One call from the active section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveEntry {
    /// Call identifier.
    pub id: CallId,
    /// Raw status string (empty when absent).
    pub status: String,
    /// Elapsed seconds, `None` when absent or not coercible.
    pub duration: Option<u64>,
    /// Caller id.
    pub subscriber_id: String,
    /// Termination descriptor used to derive the region.
    pub termination: String,
}

impl ActiveEntry {
    /// Returns true when the call is connected.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.status == STATUS_UP
    }
}

/// One call from the ended section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndedEntry {
    /// Call identifier.
    pub id: CallId,
    /// Reported final duration, `None` when absent or not coercible.
    pub duration: Option<u64>,
}

/// Flattened snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedSnapshot {
    /// Active-section calls in feed order.
    pub active: Vec<ActiveEntry>,
    /// Ended-section calls in feed order.
    pub ended: Vec<EndedEntry>,
}

impl NormalizedSnapshot {
    /// Returns true when neither section carries any call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.ended.is_empty()
    }
}

/// Flatten a raw snapshot payload.
///
/// Individual calls without an identifier (or that are not objects) are
/// skipped. Structural problems with the envelope itself are reported as
/// [`CoreError::MalformedSnapshot`] so the caller can leave its state alone.
///
/// # Errors
///
/// Returns [`CoreError::MalformedSnapshot`] when the payload is not an
/// object, has no `calls` object, or `calls.calls` / `calls.end` have an
/// unexpected type.
pub fn normalize(payload: &Value) -> CoreResult<NormalizedSnapshot> {
    let root = payload
        .as_object()
        .ok_or_else(|| malformed("payload is not an object"))?;
    let calls = root
        .get("calls")
        .ok_or_else(|| malformed("missing `calls` section"))?
        .as_object()
        .ok_or_else(|| malformed("`calls` is not an object"))?;

    let active = match calls.get("calls") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(pages)) => pages.iter().flat_map(page_entries).collect(),
        // A bare map is one keyed page.
        Some(page @ Value::Object(_)) => page_entries(page),
        Some(_) => return Err(malformed("`calls.calls` is neither a list nor a map")),
    };

    let ended = match calls.get("end") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(ended_entry).collect(),
        Some(_) => return Err(malformed("`calls.end` is not a list")),
    };

    Ok(NormalizedSnapshot { active, ended })
}

fn malformed(reason: &str) -> CoreError {
    CoreError::MalformedSnapshot(reason.to_string())
}

fn page_entries(page: &Value) -> Vec<ActiveEntry> {
    match page {
        Value::Object(map) => map.values().filter_map(active_entry).collect(),
        Value::Array(items) => items.iter().filter_map(active_entry).collect(),
        _ => Vec::new(),
    }
}

fn active_entry(value: &Value) -> Option<ActiveEntry> {
    let call = value.as_object()?;
    let id = call_id(call)?;
    Some(ActiveEntry {
        id,
        status: string_field(call, "status").unwrap_or_default(),
        duration: call.get("duration").and_then(coerce_duration),
        subscriber_id: string_field(call, "cid_num")
            .unwrap_or_else(|| UNKNOWN_SUBSCRIBER.to_string()),
        termination: string_field(call, "termination")
            .unwrap_or_else(|| UNKNOWN_TERMINATION.to_string()),
    })
}

fn ended_entry(value: &Value) -> Option<EndedEntry> {
    let call = value.as_object()?;
    Some(EndedEntry {
        id: call_id(call)?,
        duration: call.get("duration").and_then(coerce_duration),
    })
}

fn call_id(call: &Map<String, Value>) -> Option<CallId> {
    let id = string_field(call, "uuid")?;
    if id.is_empty() { None } else { Some(CallId::new(id)) }
}

/// Strings are taken as-is, numbers are rendered, anything else is absent.
fn string_field(call: &Map<String, Value>, key: &str) -> Option<String> {
    match call.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a duration value to whole non-negative seconds.
///
/// Accepts integers, floats (truncated) and numeric strings. Negative values
/// clamp to zero. Anything else yields `None`.
#[must_use]
pub fn coerce_duration(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|v| u64::try_from(v).unwrap_or(0)))
            .or_else(|| n.as_f64().map(float_seconds)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(|v| u64::try_from(v).unwrap_or(0))
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(float_seconds))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_seconds(value: f64) -> u64 {
    if value <= 0.0 { 0 } else { value.trunc() as u64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn keyed_and_listed_pages_flatten_in_order() {
        let payload = json!({
            "calls": {
                "calls": [
                    {"a": {"uuid": "A", "status": "up", "duration": "4", "cid_num": "111", "termination": "France Mobile"}},
                    [{"uuid": "B", "status": "ringing"}, {"uuid": "C", "status": "up", "duration": 9}]
                ]
            }
        });
        let snap = normalize(&payload).unwrap();
        let ids: Vec<&str> = snap.active.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(snap.active[0].duration, Some(4));
        assert_eq!(snap.active[0].subscriber_id, "111");
        assert_eq!(snap.active[1].subscriber_id, UNKNOWN_SUBSCRIBER);
        assert_eq!(snap.active[1].termination, UNKNOWN_TERMINATION);
        assert!(!snap.active[1].is_up());
        assert!(snap.active[2].is_up());
        assert!(snap.ended.is_empty());
    }

    #[test]
    fn bare_map_is_one_page() {
        let payload = json!({"calls": {"calls": {"x": {"uuid": "X", "status": "up"}}}});
        let snap = normalize(&payload).unwrap();
        assert_eq!(snap.active.len(), 1);
        assert_eq!(snap.active[0].duration, None);
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let payload = json!({
            "calls": {
                "calls": [[{"status": "up"}, {"uuid": "", "status": "up"}, "junk", {"uuid": "K", "status": "up"}]],
                "end": [{"duration": 3}, {"uuid": "K", "duration": "12"}]
            }
        });
        let snap = normalize(&payload).unwrap();
        assert_eq!(snap.active.len(), 1);
        assert_eq!(snap.ended, vec![EndedEntry { id: CallId::new("K"), duration: Some(12) }]);
    }

    #[test]
    fn numeric_caller_id_is_rendered() {
        let payload = json!({"calls": {"calls": [[{"uuid": "N", "cid_num": 85512345}]]}});
        let snap = normalize(&payload).unwrap();
        assert_eq!(snap.active[0].subscriber_id, "85512345");
    }

    #[test]
    fn malformed_envelopes_are_errors() {
        for payload in [
            json!("text"),
            json!([]),
            json!({}),
            json!({"calls": 5}),
            json!({"calls": {"calls": "x"}}),
            json!({"calls": {"calls": [], "end": {}}}),
        ] {
            assert!(
                matches!(normalize(&payload), Err(CoreError::MalformedSnapshot(_))),
                "expected malformed: {payload}"
            );
        }
    }

    #[test]
    fn empty_sections_are_valid() {
        let snap = normalize(&json!({"calls": {"calls": []}})).unwrap();
        assert!(snap.is_empty());
        let snap = normalize(&json!({"calls": {}})).unwrap();
        assert!(snap.is_empty());
    }

    #[test]
    fn duration_coercion() {
        assert_eq!(coerce_duration(&json!(7)), Some(7));
        assert_eq!(coerce_duration(&json!(-3)), Some(0));
        assert_eq!(coerce_duration(&json!(12.9)), Some(12));
        assert_eq!(coerce_duration(&json!(" 42 ")), Some(42));
        assert_eq!(coerce_duration(&json!("8.5")), Some(8));
        assert_eq!(coerce_duration(&json!("-1")), Some(0));
        assert_eq!(coerce_duration(&json!("abc")), None);
        assert_eq!(coerce_duration(&json!("NaN")), None);
        assert_eq!(coerce_duration(&json!(null)), None);
        assert_eq!(coerce_duration(&json!(true)), None);
    }
}
