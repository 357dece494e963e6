//! Per-operator statistics aggregate.

use super::column::ColumnStatistic;
use super::math::{clamp_count, max_non_nan};
use super::range::StatisticRange;
use cardo_common::{ColumnId, Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The estimate derived for one group expression: an output row count plus
/// one [`ColumnStatistic`] per output column.
///
/// Owned exclusively by the group expression that produced it; the owning
/// group may cache a copy, but that copy is logically independent. All
/// "mutating" operations return new instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    row_count: f64,
    columns: IndexMap<ColumnId, ColumnStatistic>,
    width: f64,
    penalty: f64,
}

impl Statistics {
    /// Creates a statistics value from a row count and column map.
    ///
    /// The row count is clamped to `[0, +inf)` and NaN-scrubbed; the row
    /// width is the sum of the known average column sizes.
    #[must_use]
    pub fn new(row_count: f64, columns: IndexMap<ColumnId, ColumnStatistic>) -> Self {
        let width = columns
            .values()
            .filter_map(|stat| stat.avg_size_bytes)
            .sum();
        Self {
            row_count: clamp_count(row_count),
            columns,
            width,
            penalty: 0.0,
        }
    }

    /// Estimated output row count. May be fractional, never negative.
    #[must_use]
    pub fn row_count(&self) -> f64 {
        self.row_count
    }

    /// Sum of the known average column sizes, in bytes per row.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Accumulated estimation-cost bookkeeping. Used only to break ties
    /// between equal-row-count alternatives, never as a correctness measure.
    #[must_use]
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Returns a copy with the penalty replaced.
    #[must_use]
    pub fn with_penalty(mut self, penalty: f64) -> Self {
        self.penalty = clamp_count(penalty);
        self
    }

    /// Returns a copy with the row count replaced and all column statistics
    /// unchanged.
    #[must_use]
    pub fn with_row_count(&self, row_count: f64) -> Self {
        Self {
            row_count: clamp_count(row_count),
            columns: self.columns.clone(),
            width: self.width,
            penalty: self.penalty,
        }
    }

    /// Returns a copy with one column statistic inserted or replaced.
    #[must_use]
    pub fn with_column(mut self, column: ColumnId, stat: ColumnStatistic) -> Self {
        self.columns.insert(column, stat);
        self.width = self
            .columns
            .values()
            .filter_map(|s| s.avg_size_bytes)
            .sum();
        self
    }

    /// Looks up the statistic for an output column.
    ///
    /// Callers must only query columns that are part of the current output;
    /// anything else is an upstream plumbing bug surfaced as an error.
    pub fn column_statistic(&self, column: ColumnId) -> Result<&ColumnStatistic> {
        self.columns
            .get(&column)
            .ok_or(Error::ColumnStatisticNotFound { column })
    }

    /// Looks up the statistic for a column that may not be present.
    #[must_use]
    pub fn find_column(&self, column: ColumnId) -> Option<&ColumnStatistic> {
        self.columns.get(&column)
    }

    /// The full output-column map.
    #[must_use]
    pub fn column_statistics(&self) -> &IndexMap<ColumnId, ColumnStatistic> {
        &self.columns
    }
}

/// Combines two populations' statistics for the same output column, as used
/// by union estimation.
///
/// Bounds and distinct counts combine through [`StatisticRange::union`];
/// null counts add; the average size is the null-count-weighted mean of the
/// two inputs' averages, or 0 when the combined non-null population is
/// empty. Unknown inputs stay unknown.
#[must_use]
pub fn union_column(
    left: &ColumnStatistic,
    left_rows: f64,
    right: &ColumnStatistic,
    right_rows: f64,
) -> ColumnStatistic {
    let range = StatisticRange::from_column(left).union(&StatisticRange::from_column(right));
    let new_rows = clamp_count(left_rows + right_rows);

    let num_nulls = match (left.num_nulls, right.num_nulls) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    };

    let avg_size_bytes = match (num_nulls, left.avg_size_bytes, right.avg_size_bytes) {
        (Some(nulls), Some(left_avg), Some(right_avg)) => {
            let left_size = clamp_count(left_rows - left.num_nulls.unwrap_or(0.0)) * left_avg;
            let right_size = clamp_count(right_rows - right.num_nulls.unwrap_or(0.0)) * right_avg;
            let null_fraction = nulls / max_non_nan(1.0, new_rows);
            let non_null_rows = new_rows * (1.0 - null_fraction);
            if non_null_rows <= 0.0 {
                Some(0.0)
            } else {
                Some((left_size + right_size) / non_null_rows)
            }
        }
        _ => None,
    };

    ColumnStatistic {
        count: Some(new_rows),
        ndv: range.distinct,
        num_nulls,
        min_value: range.low,
        max_value: range.high,
        avg_size_bytes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(id: u64) -> ColumnId {
        ColumnId::new(id)
    }

    fn stat(count: f64, ndv: f64, nulls: f64, min: f64, max: f64, avg: f64) -> ColumnStatistic {
        ColumnStatistic::unknown()
            .with_count(count)
            .with_ndv(ndv)
            .with_num_nulls(nulls)
            .with_range(min, max)
            .with_avg_size(avg)
    }

    #[test]
    fn test_row_count_clamped() {
        let stats = Statistics::new(-10.0, IndexMap::new());
        assert!((stats.row_count()).abs() < f64::EPSILON);
        let stats = Statistics::new(f64::NAN, IndexMap::new());
        assert!((stats.row_count()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_row_count_preserves_columns() {
        let mut columns = IndexMap::new();
        columns.insert(col(1), stat(100.0, 10.0, 0.0, 0.0, 9.0, 8.0));
        let stats = Statistics::new(100.0, columns);
        let reduced = stats.with_row_count(5.0);
        assert!((reduced.row_count() - 5.0).abs() < f64::EPSILON);
        assert_eq!(
            reduced.column_statistic(col(1)).unwrap(),
            stats.column_statistic(col(1)).unwrap()
        );
    }

    #[test]
    fn test_width_sums_known_sizes() {
        let mut columns = IndexMap::new();
        columns.insert(col(1), stat(10.0, 10.0, 0.0, 0.0, 9.0, 8.0));
        columns.insert(col(2), ColumnStatistic::unknown());
        columns.insert(col(3), stat(10.0, 10.0, 0.0, 0.0, 9.0, 4.0));
        let stats = Statistics::new(10.0, columns);
        assert!((stats.width() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_column_statistic_not_found() {
        let stats = Statistics::new(1.0, IndexMap::new());
        assert_eq!(
            stats.column_statistic(col(9)).unwrap_err(),
            cardo_common::Error::ColumnStatisticNotFound { column: col(9) }
        );
    }

    #[test]
    fn test_union_column_disjoint() {
        let left = stat(100.0, 10.0, 0.0, 0.0, 10.0, 8.0);
        let right = stat(50.0, 5.0, 0.0, 20.0, 30.0, 8.0);
        let merged = union_column(&left, 100.0, &right, 50.0);
        assert_eq!(merged.count, Some(150.0));
        assert_eq!(merged.min_value, Some(0.0));
        assert_eq!(merged.max_value, Some(30.0));
        assert!((merged.ndv.unwrap() - 15.0).abs() < 1e-9);
        assert!((merged.avg_size_bytes.unwrap() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_column_null_weighted_size() {
        // Left: 80 non-null rows of width 10; right: 40 non-null rows of
        // width 4. Combined average weights by non-null populations.
        let left = stat(100.0, 10.0, 20.0, 0.0, 10.0, 10.0);
        let right = stat(50.0, 5.0, 10.0, 20.0, 30.0, 4.0);
        let merged = union_column(&left, 100.0, &right, 50.0);
        assert_eq!(merged.num_nulls, Some(30.0));
        let expected = (80.0 * 10.0 + 40.0 * 4.0) / 120.0;
        assert!((merged.avg_size_bytes.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_union_column_empty_populations() {
        let left = stat(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let right = stat(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let merged = union_column(&left, 0.0, &right, 0.0);
        // Guarded division: no NaN out of empty inputs.
        assert_eq!(merged.count, Some(0.0));
        assert!((merged.avg_size_bytes.unwrap()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_union_column_unknown_contagious() {
        let left = stat(100.0, 10.0, 0.0, 0.0, 10.0, 8.0);
        let merged = union_column(&left, 100.0, &ColumnStatistic::unknown(), 50.0);
        assert_eq!(merged.num_nulls, None);
        assert_eq!(merged.avg_size_bytes, None);
        // Row counts are known regardless of column-level unknowns.
        assert_eq!(merged.count, Some(150.0));
    }
}
