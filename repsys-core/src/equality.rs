//! Deep equality used as the no-op guard before diffing.

use std::sync::Arc;

use serde_json::Value;

/// Deep structural equality over engine records.
///
/// Numbers compare by value regardless of representation (`1` equals `1.0`).
/// An absent key is distinct from `null`, `0` or an empty value.
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x == y {
                return true;
            }
            match (x.as_f64(), y.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| equal(x, y)))
        }
        _ => a == b,
    }
}

/// Identity first, then deep equality. Untouched entities of a persistent
/// snapshot share their `Arc`, so this is O(1) for them.
pub fn same<T: PartialEq + ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}
