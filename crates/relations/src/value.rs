//! Key Values - Hashable representation of local/foreign key values
//!
//! Attribute values are stored as `serde_json::Value`, which cannot be used as a
//! map key. `KeyValue` is the subset of values that can identify a row and is
//! what the row grouper and the preloader key their lookups by.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Key value types supported for relation matching
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    /// Integer key (serial, bigserial)
    Integer(i64),
    /// Textual key, including UUIDs in their hyphenated form
    String(String),
    /// Boolean key (rare, but valid in composite lookups)
    Bool(bool),
}

impl KeyValue {
    /// Convert a JSON attribute value to a key value.
    ///
    /// Returns `None` for `null`. Non-integral numbers and compound values are
    /// keyed by their JSON text so that they still group consistently.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(KeyValue::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(KeyValue::Integer(i)),
                None => Some(KeyValue::String(n.to_string())),
            },
            Value::String(s) => Some(KeyValue::String(s.clone())),
            other => Some(KeyValue::String(other.to_string())),
        }
    }

    /// Convert back to a JSON value for query bindings
    pub fn to_json(&self) -> Value {
        match self {
            KeyValue::Integer(i) => Value::from(*i),
            KeyValue::String(s) => Value::String(s.clone()),
            KeyValue::Bool(b) => Value::Bool(*b),
        }
    }

    /// Extract as i64 if this is an Integer key
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            KeyValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract as str if this is a String key
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValue::Integer(i) => write!(f, "{}", i),
            KeyValue::String(s) => write!(f, "{}", s),
            KeyValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Integer(value)
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Integer(value as i64)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::String(value)
    }
}

// UUIDs arrive from the database as strings, so they are keyed the same way
impl From<Uuid> for KeyValue {
    fn from(value: Uuid) -> Self {
        KeyValue::String(value.to_string())
    }
}

impl From<KeyValue> for Value {
    fn from(value: KeyValue) -> Self {
        value.to_json()
    }
}
