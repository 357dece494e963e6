//! Per-column distribution summaries.

use serde::{Deserialize, Serialize};

/// Summary of one output column's value distribution.
///
/// Every field is optional: `None` means the quantity is unknown, and
/// unknowns are contagious through the estimation algebra. Instances are
/// immutable; derivation copies a base value and overrides fields through
/// the `with_*` constructors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnStatistic {
    /// Rows attributed to this column. May be fractional.
    pub count: Option<f64>,
    /// Estimated number of distinct values.
    pub ndv: Option<f64>,
    /// Estimated number of NULL rows. At most `count` when both are known.
    pub num_nulls: Option<f64>,
    /// Lower bound of the value domain, projected onto f64.
    pub min_value: Option<f64>,
    /// Upper bound of the value domain, projected onto f64.
    pub max_value: Option<f64>,
    /// Average encoded width of a value in bytes.
    pub avg_size_bytes: Option<f64>,
}

impl ColumnStatistic {
    /// The all-unknown statistic. This is the escape hatch every estimator
    /// falls back to when it cannot reason about an input.
    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Returns `true` when nothing at all is known about the column.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.count.is_none()
            && self.ndv.is_none()
            && self.num_nulls.is_none()
            && self.min_value.is_none()
            && self.max_value.is_none()
            && self.avg_size_bytes.is_none()
    }

    /// Returns a copy with the row count replaced.
    #[must_use]
    pub fn with_count(mut self, count: f64) -> Self {
        self.count = Some(count.max(0.0));
        self
    }

    /// Returns a copy with the distinct-value estimate replaced.
    #[must_use]
    pub fn with_ndv(mut self, ndv: f64) -> Self {
        self.ndv = Some(ndv.max(0.0));
        self
    }

    /// Returns a copy with the null count replaced.
    #[must_use]
    pub fn with_num_nulls(mut self, num_nulls: f64) -> Self {
        self.num_nulls = Some(num_nulls.max(0.0));
        self
    }

    /// Returns a copy with the min/max bounds replaced.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    /// Returns a copy with the bounds cleared to unknown.
    #[must_use]
    pub fn with_unknown_range(mut self) -> Self {
        self.min_value = None;
        self.max_value = None;
        self
    }

    /// Returns a copy with the average value width replaced.
    #[must_use]
    pub fn with_avg_size(mut self, avg_size_bytes: f64) -> Self {
        self.avg_size_bytes = Some(avg_size_bytes.max(0.0));
        self
    }

    /// Fraction of rows that are NULL, when both quantities are known.
    ///
    /// The denominator is clamped to at least 1 so an empty population
    /// yields a fraction of 0 rather than a division by zero.
    #[must_use]
    pub fn null_fraction(&self) -> Option<f64> {
        let count = self.count?;
        let nulls = self.num_nulls?;
        Some((nulls / count.max(1.0)).clamp(0.0, 1.0))
    }
}
