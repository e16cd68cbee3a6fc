//! Response envelope unwrapping.
//!
//! Endpoints answer with a bare array or wrap it as `{data: [...]}`,
//! `{items: [...]}` or `{results: [...]}`. Anything else is treated as an
//! empty list by the soft callers.

use serde_json::Value;

/// Keys checked, in order, for a wrapped list.
pub const ENVELOPE_KEYS: &[&str] = &["data", "items", "results"];

/// The wrapped list, if the body has a recognized shape.
pub fn envelope_items(body: &Value) -> Option<&Vec<Value>> {
    if let Value::Array(items) = body {
        return Some(items);
    }
    let obj = body.as_object()?;
    ENVELOPE_KEYS
        .iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_array))
}

/// Flat item list; unrecognized shapes yield an empty list.
pub fn unwrap_envelope(body: &Value) -> Vec<Value> {
    envelope_items(body).cloned().unwrap_or_default()
}

/// Single-object responses may also arrive wrapped in `data`.
pub fn unwrap_object<'a>(body: &'a Value, id_key: &str) -> Option<&'a Value> {
    let obj = body.as_object()?;
    if obj.contains_key(id_key) {
        return Some(body);
    }
    match obj.get("data") {
        Some(inner @ Value::Object(_)) => Some(inner),
        _ => None,
    }
}
