use std::collections::HashSet;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::value::LogValue;

/// Marker substituted for a container that is revisited within one
/// serialization pass.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Error type returned when a context value cannot be converted.
#[derive(thiserror::Error, Debug)]
pub enum ContextError {
    #[error("context serialization failed: {0}")]
    Capture(#[from] serde_json::Error),
}

/// Convert a [`LogValue`] tree into a plain [`serde_json::Value`].
///
/// Containers are tracked by identity for the duration of the call;
/// a container seen a second time (its own ancestor, or an aliased
/// sibling visited earlier) renders as [`CIRCULAR_MARKER`] instead of
/// being entered again, so conversion always terminates. Two distinct
/// containers with equal contents are unrelated.
///
/// The only error source is a failing [`LogValue::Computed`] capture;
/// the record builder maps that onto the degraded record. This
/// function never panics.
pub fn to_json(value: &LogValue) -> Result<Value, ContextError> {
    let mut seen = HashSet::new();
    walk(value, &mut seen)
}

fn walk(value: &LogValue, seen: &mut HashSet<usize>) -> Result<Value, ContextError> {
    match value {
        LogValue::Null => Ok(Value::Null),
        LogValue::Bool(b) => Ok(Value::Bool(*b)),
        LogValue::Number(n) => Ok(Value::Number(n.clone())),
        LogValue::String(s) => Ok(Value::String(s.clone())),
        LogValue::Array(items) => {
            if !seen.insert(Rc::as_ptr(items) as usize) {
                return Ok(Value::String(CIRCULAR_MARKER.to_string()));
            }
            let items = items.borrow();
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                out.push(walk(item, seen)?);
            }
            Ok(Value::Array(out))
        }
        LogValue::Object(map) => {
            if !seen.insert(Rc::as_ptr(map) as usize) {
                return Ok(Value::String(CIRCULAR_MARKER.to_string()));
            }
            let map = map.borrow();
            let mut out = Map::new();
            for (key, item) in map.iter() {
                out.insert(key.clone(), walk(item, seen)?);
            }
            Ok(Value::Object(out))
        }
        LogValue::Computed(capture) => Ok((**capture)()?),
    }
}
