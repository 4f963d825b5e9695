//! Recursive overlay of config layers.

use serde_json::Value;

/// Apply `top` over `base`: objects merge key by key, anything else replaces.
pub(super) fn overlay(base: &mut Value, top: Value) {
    match (base, top) {
        (Value::Object(base), Value::Object(top)) => {
            for (key, value) in top {
                overlay(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}
