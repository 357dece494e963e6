//! Scalar literal values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar literal appearing in a plan expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The SQL NULL value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int64(i64),
    /// A 64-bit float.
    Float64(f64),
    /// A UTF-8 string.
    String(String),
}

impl Value {
    /// Returns `true` for the NULL value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Projects the value onto the numeric domain used by range estimation.
    ///
    /// Strings and NULL have no numeric image; booleans map to 0/1 so that
    /// boolean columns can still carry min/max bounds.
    #[must_use]
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Value::Null | Value::String(_) => None,
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int64(i) => Some(*i as f64),
            Value::Float64(f) => Some(*f),
        }
    }

    /// Average encoded width of the value in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> f64 {
        match self {
            Value::Null | Value::Bool(_) => 1.0,
            Value::Int64(_) | Value::Float64(_) => 8.0,
            Value::String(s) => s.len() as f64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "'{s}'"),
        }
    }
}
