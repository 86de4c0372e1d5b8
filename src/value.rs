use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Number;

/// Shared array node. Cloning the handle shares the storage.
pub type SharedArray = Rc<RefCell<Vec<LogValue>>>;

/// Shared object node. Cloning the handle shares the storage.
pub type SharedObject = Rc<RefCell<BTreeMap<String, LogValue>>>;

/// Deferred serde capture, evaluated once per log call.
pub type ComputeFn = dyn Fn() -> Result<serde_json::Value, serde_json::Error>;

/// Caller-supplied context value.
///
/// Scalars are stored inline; arrays and objects are reference
/// counted, so a node may appear in several places at once, including
/// inside itself. The serializer resolves shared nodes by identity and
/// substitutes a marker for revisits instead of recursing forever.
///
/// [`LogValue::capture`] embeds any [`Serialize`] type; its
/// serialization runs when the record is built, and a failure there
/// degrades the record rather than losing the log line.
#[derive(Clone)]
pub enum LogValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(SharedArray),
    Object(SharedObject),
    Computed(Rc<ComputeFn>),
}

impl LogValue {
    /// New empty shared object.
    pub fn object() -> LogValue {
        LogValue::Object(Rc::new(RefCell::new(BTreeMap::new())))
    }

    /// New empty shared array.
    pub fn array() -> LogValue {
        LogValue::Array(Rc::new(RefCell::new(Vec::new())))
    }

    /// Capture an arbitrary [`Serialize`] value. The conversion is
    /// deferred until the value is turned into a record, so a failing
    /// implementation degrades that one record only.
    pub fn capture<T: Serialize + 'static>(value: T) -> LogValue {
        LogValue::Computed(Rc::new(move || serde_json::to_value(&value)))
    }

    /// Insert a key into an object node. No-op on other variants.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<LogValue>) {
        if let LogValue::Object(map) = self {
            map.borrow_mut().insert(key.into(), value.into());
        }
    }

    /// Append to an array node. No-op on other variants.
    pub fn push(&self, value: impl Into<LogValue>) {
        if let LogValue::Array(items) = self {
            items.borrow_mut().push(value.into());
        }
    }
}

impl fmt::Debug for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Null => f.write_str("Null"),
            LogValue::Bool(b) => write!(f, "Bool({b})"),
            LogValue::Number(n) => write!(f, "Number({n})"),
            LogValue::String(s) => write!(f, "String({s:?})"),
            // Shared nodes may be cyclic; show only their size.
            LogValue::Array(items) => write!(f, "Array(len={})", items.borrow().len()),
            LogValue::Object(map) => write!(f, "Object(len={})", map.borrow().len()),
            LogValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<bool> for LogValue {
    fn from(value: bool) -> Self {
        LogValue::Bool(value)
    }
}

impl From<i32> for LogValue {
    fn from(value: i32) -> Self {
        LogValue::Number(Number::from(value))
    }
}

impl From<i64> for LogValue {
    fn from(value: i64) -> Self {
        LogValue::Number(Number::from(value))
    }
}

impl From<u32> for LogValue {
    fn from(value: u32) -> Self {
        LogValue::Number(Number::from(value))
    }
}

impl From<u64> for LogValue {
    fn from(value: u64) -> Self {
        LogValue::Number(Number::from(value))
    }
}

impl From<f64> for LogValue {
    fn from(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(number) => LogValue::Number(number),
            None => LogValue::Null,
        }
    }
}

impl From<&str> for LogValue {
    fn from(value: &str) -> Self {
        LogValue::String(value.to_string())
    }
}

impl From<String> for LogValue {
    fn from(value: String) -> Self {
        LogValue::String(value)
    }
}

impl From<Vec<LogValue>> for LogValue {
    fn from(items: Vec<LogValue>) -> Self {
        LogValue::Array(Rc::new(RefCell::new(items)))
    }
}

impl From<BTreeMap<String, LogValue>> for LogValue {
    fn from(map: BTreeMap<String, LogValue>) -> Self {
        LogValue::Object(Rc::new(RefCell::new(map)))
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => LogValue::Null,
            serde_json::Value::Bool(b) => LogValue::Bool(b),
            serde_json::Value::Number(n) => LogValue::Number(n),
            serde_json::Value::String(s) => LogValue::String(s),
            serde_json::Value::Array(items) => LogValue::Array(Rc::new(RefCell::new(
                items.into_iter().map(LogValue::from).collect(),
            ))),
            serde_json::Value::Object(map) => LogValue::Object(Rc::new(RefCell::new(
                map.into_iter()
                    .map(|(key, item)| (key, LogValue::from(item)))
                    .collect(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn object_and_array_builders() {
        let obj = LogValue::object();
        obj.insert("id", 7);
        obj.insert("name", "worker");

        let items = LogValue::array();
        items.push(1);
        items.push(2);
        obj.insert("items", items);

        match &obj {
            LogValue::Object(map) => {
                let map = map.borrow();
                assert_eq!(map.len(), 3);
                assert!(matches!(map.get("name"), Some(LogValue::String(s)) if s == "worker"));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn insert_on_scalar_is_a_noop() {
        let scalar = LogValue::from(5);
        scalar.insert("key", "value");
        assert!(matches!(scalar, LogValue::Number(_)));
    }

    #[test]
    fn json_values_convert_structurally() {
        let value = LogValue::from(json!({"a": [1, "two"], "b": null}));
        match value {
            LogValue::Object(map) => {
                let map = map.borrow();
                assert!(matches!(map.get("b"), Some(LogValue::Null)));
                assert!(matches!(map.get("a"), Some(LogValue::Array(_))));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert!(matches!(LogValue::from(f64::NAN), LogValue::Null));
        assert!(matches!(LogValue::from(1.5), LogValue::Number(_)));
    }
}
