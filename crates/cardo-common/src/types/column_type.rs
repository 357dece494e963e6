//! Declared column types.

use serde::{Deserialize, Serialize};

/// The declared logical type of a column.
///
/// The estimator only needs types for their average encoded width, which
/// feeds the `avg_size_bytes` statistic of columns whose values it has never
/// seen (e.g. freshly generated ones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    /// Boolean.
    Boolean,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Calendar date.
    Date,
    /// Microsecond timestamp.
    Timestamp,
    /// Variable-length string.
    Varchar,
}

impl ColumnType {
    /// Average width of a value of this type in bytes.
    ///
    /// Fixed-width types report their exact width; `Varchar` reports a flat
    /// default since the true average is only known from collected statistics.
    #[must_use]
    pub fn width(self) -> f64 {
        match self {
            ColumnType::Boolean => 1.0,
            ColumnType::Int32 | ColumnType::Float32 | ColumnType::Date => 4.0,
            ColumnType::Int64 | ColumnType::Float64 | ColumnType::Timestamp => 8.0,
            ColumnType::Varchar => 16.0,
        }
    }
}
