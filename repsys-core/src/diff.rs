//! Sparse patches between two versions of an engine record.
//!
//! Records are compared key by key. Nested objects are recursed into, arrays
//! are atomic: a changed array is replaced wholesale. Keys that disappear are
//! never represented; deletions only happen through lifecycle remove calls.

use serde::Serialize;
use serde_json::{Map, Value};

use repsys_engine::Patch;

use crate::equality::equal;

/// Keys of `current` whose value differs from `previous`.
///
/// `None` (or a non-object) as `previous` yields every key of `current`. A
/// non-object `current` yields an empty patch.
pub fn diff(previous: Option<&Value>, current: &Value) -> Patch {
    match current {
        Value::Object(cur) => Patch::from(diff_maps(previous.and_then(Value::as_object), cur)),
        _ => Patch::new(),
    }
}

fn diff_maps(previous: Option<&Map<String, Value>>, current: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, cur) in current {
        match (previous.and_then(|p| p.get(key)), cur) {
            (Some(prev), _) if equal(prev, cur) => {}
            (Some(Value::Object(prev)), Value::Object(cur)) => {
                let nested = diff_maps(Some(prev), cur);
                if !nested.is_empty() {
                    out.insert(key.clone(), Value::Object(nested));
                }
            }
            _ => {
                out.insert(key.clone(), cur.clone());
            }
        }
    }
    out
}

/// Serialize both records and diff them. Serialization of the plain record
/// types used here cannot fail; a failure yields an empty patch.
pub fn diff_records<T: Serialize>(previous: Option<&T>, current: &T) -> Patch {
    let current = match serde_json::to_value(current) {
        Ok(v) => v,
        Err(e) => {
            log::warn!(target: "reconcile", "unserializable record: {}", e);
            return Patch::new();
        }
    };
    let previous = previous.and_then(|p| serde_json::to_value(p).ok());
    diff(previous.as_ref(), &current)
}
