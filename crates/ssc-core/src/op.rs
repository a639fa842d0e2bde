//! Opaque operations

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A server-validated mutation description.
///
/// The client never interprets the internal structure of an operation; it is
/// applied optimistically by the operation-application runtime and reconciled
/// by the server. The constructors below only build JSON following the
/// insert/delete list-operation convention - they do not validate it, the
/// server does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operation(Value);

impl Operation {
    /// Wrap an already-built operation value
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Insert `value` at `path` (object insert / list insert when the last
    /// path segment is an index)
    pub fn insert(path: &[Value], value: Value) -> Self {
        Self(json!([{ "p": path, "li": value }]))
    }

    /// Remove the current `value` at `path`
    pub fn remove(path: &[Value], value: Value) -> Self {
        Self(json!([{ "p": path, "ld": value }]))
    }

    /// Replace `old` with `new` at `path`
    pub fn replace(path: &[Value], old: Value, new: Value) -> Self {
        Self(json!([{ "p": path, "ld": old, "li": new }]))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Operation {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
