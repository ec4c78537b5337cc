//! Structural utilities over `serde_json::Value`.
//!
//! Entities and snapshots are compared, merged and copied in their structural
//! (JSON value) form. Deep equality is `Value`'s own `PartialEq` and a deep
//! clone is `Clone`; this module adds the recursive merge and the change-set
//! diff.

use serde_json::{Map, Value};

use crate::error::{EntityError, EntityResult};

/// Recursively merge `source` into `target`.
///
/// Mappings merge key by key, depth-first. Every other source value (scalars,
/// arrays, `null`) replaces the target value wholesale. Keys absent from
/// `source` are left untouched.
pub fn merge(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, incoming) in source {
                match target.get_mut(key) {
                    Some(existing) => merge(existing, incoming),
                    None => {
                        target.insert(key.clone(), incoming.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Keys of `data` whose value differs structurally from the same key in `current`.
///
/// A key missing from `current` always counts as changed.
pub fn diff(current: &Value, data: &Value) -> EntityResult<Map<String, Value>> {
    let data = as_mapping("diff", data)?;
    let current = current.as_object();

    Ok(data
        .iter()
        .filter(|(key, value)| current.and_then(|c| c.get(*key)) != Some(*value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect())
}

/// Copy of a mapping without `key`.
pub fn omit(value: &Value, key: &str) -> EntityResult<Value> {
    let mut map = as_mapping("omit", value)?.clone();
    map.remove(key);
    Ok(Value::Object(map))
}

/// Borrow `value` as a mapping or fail with [`EntityError::NotAMapping`].
pub fn as_mapping<'a>(operation: &'static str, value: &'a Value) -> EntityResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| EntityError::not_a_mapping(operation, value))
}
