//! Statistics estimation for joins.

use super::filter;
use crate::plan::{JoinOp, JoinType};
use cardo_common::ColumnId;
use cardo_core::statistics::math::{clamp_count, max_non_nan};
use cardo_core::{ColumnStatistic, Statistics};
use indexmap::IndexMap;

/// Selectivity an equi-join pair contributes when either side's distinct
/// count is unknown. Multiplying by an unknown factor is never an option.
pub(crate) const DEFAULT_EQUI_SELECTIVITY: f64 = 0.1;

/// Estimates the statistics of joining `left` and `right` under `join`.
///
/// Equi pairs contribute `1 / max(ndv_left, ndv_right)` each, composed
/// multiplicatively; residual predicates are applied through the filter
/// estimator on the joined intermediate; the join kind then floors or caps
/// the row count (outer joins preserve their side, semi/anti are bounded by
/// the probe side).
#[must_use]
pub fn estimate(left: &Statistics, right: &Statistics, join: &JoinOp) -> Statistics {
    let left_rows = left.row_count();
    let right_rows = right.row_count();

    // Output columns of the joined intermediate: both sides, with surviving
    // equi columns narrowed to the smaller side's domain.
    let mut columns: IndexMap<ColumnId, ColumnStatistic> = left.column_statistics().clone();
    for (id, stat) in right.column_statistics() {
        columns.insert(*id, stat.clone());
    }

    let mut selectivity = 1.0;
    for pair in &join.equi_conditions {
        let left_ndv = left.find_column(pair.left).and_then(|s| s.ndv);
        let right_ndv = right.find_column(pair.right).and_then(|s| s.ndv);
        match (left_ndv, right_ndv) {
            (Some(l), Some(r)) => {
                selectivity *= 1.0 / max_non_nan(1.0, l.max(r));
                // Values outside the smaller side's domain cannot survive.
                let surviving = l.min(r);
                for id in [pair.left, pair.right] {
                    if let Some(stat) = columns.get_mut(&id) {
                        *stat = stat.clone().with_ndv(surviving);
                    }
                }
            }
            _ => selectivity *= DEFAULT_EQUI_SELECTIVITY,
        }
    }

    let inner_rows = clamp_count(left_rows * right_rows * selectivity);
    let mut intermediate = Statistics::new(inner_rows, columns)
        .with_penalty(left.penalty() + right.penalty());
    for condition in &join.other_conditions {
        intermediate = filter::estimate(condition, &intermediate);
    }
    let inner_rows = intermediate.row_count();

    let row_count = match join.join_type {
        JoinType::Inner | JoinType::Cross => inner_rows,
        JoinType::LeftOuter => max_non_nan(inner_rows, left_rows),
        JoinType::RightOuter => max_non_nan(inner_rows, right_rows),
        JoinType::FullOuter => max_non_nan(inner_rows, max_non_nan(left_rows, right_rows)),
        JoinType::LeftSemi => inner_rows.min(left_rows),
        JoinType::RightSemi => inner_rows.min(right_rows),
        JoinType::LeftAnti => clamp_count(left_rows - inner_rows.min(left_rows)),
        JoinType::RightAnti => clamp_count(right_rows - inner_rows.min(right_rows)),
    };

    let output_columns: IndexMap<ColumnId, ColumnStatistic> = match join.join_type {
        JoinType::LeftSemi | JoinType::LeftAnti => project(&intermediate, left),
        JoinType::RightSemi | JoinType::RightAnti => project(&intermediate, right),
        _ => intermediate.column_statistics().clone(),
    };

    let mut result =
        Statistics::new(row_count, output_columns).with_penalty(intermediate.penalty());
    if let Some(mark) = join.mark_column {
        // Mark joins add one boolean column and change no row counts.
        let mark_stat = ColumnStatistic::unknown()
            .with_count(row_count)
            .with_ndv(2.0)
            .with_num_nulls(0.0)
            .with_range(0.0, 1.0)
            .with_avg_size(1.0);
        result = result.with_column(mark, mark_stat);
    }
    result
}

/// Restricts the intermediate's columns to the ones `side` produced.
fn project(
    intermediate: &Statistics,
    side: &Statistics,
) -> IndexMap<ColumnId, ColumnStatistic> {
    side.column_statistics()
        .keys()
        .filter_map(|id| {
            intermediate
                .find_column(*id)
                .map(|stat| (*id, stat.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{BinaryOp, EquiCondition, ScalarExpr};
    use cardo_common::Value;

    fn col(id: u64) -> ColumnId {
        ColumnId::new(id)
    }

    fn side(rows: f64, column: ColumnId, ndv: f64) -> Statistics {
        let mut columns = IndexMap::new();
        columns.insert(
            column,
            ColumnStatistic::unknown()
                .with_count(rows)
                .with_ndv(ndv)
                .with_num_nulls(0.0)
                .with_range(0.0, 1000.0)
                .with_avg_size(8.0),
        );
        Statistics::new(rows, columns)
    }

    fn equi_join(join_type: JoinType, left: ColumnId, right: ColumnId) -> JoinOp {
        JoinOp {
            join_type,
            equi_conditions: vec![EquiCondition { left, right }],
            other_conditions: vec![],
            mark_column: None,
        }
    }

    #[test]
    fn test_inner_equi_join() {
        let left = side(100.0, col(1), 10.0);
        let right = side(50.0, col(2), 25.0);
        let out = estimate(&left, &right, &equi_join(JoinType::Inner, col(1), col(2)));
        // Selectivity 1/25: 100 * 50 / 25 = 200.
        assert!((out.row_count() - 200.0).abs() < 1e-9);
        // Surviving equi columns narrow to the smaller domain.
        assert_eq!(out.column_statistic(col(1)).unwrap().ndv, Some(10.0));
        assert_eq!(out.column_statistic(col(2)).unwrap().ndv, Some(10.0));
    }

    #[test]
    fn test_cross_join_is_product() {
        let left = side(100.0, col(1), 10.0);
        let right = side(50.0, col(2), 25.0);
        let join = JoinOp {
            join_type: JoinType::Cross,
            equi_conditions: vec![],
            other_conditions: vec![],
            mark_column: None,
        };
        let out = estimate(&left, &right, &join);
        assert!((out.row_count() - 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_left_outer_preserves_left() {
        let left = side(1000.0, col(1), 1000.0);
        let right = side(10.0, col(2), 1000.0);
        let out = estimate(&left, &right, &equi_join(JoinType::LeftOuter, col(1), col(2)));
        // Inner estimate is 10 rows, but every left row appears at least once.
        assert!(out.row_count() >= 1000.0);
    }

    #[test]
    fn test_full_outer_preserves_both() {
        let left = side(1000.0, col(1), 1000.0);
        let right = side(400.0, col(2), 1000.0);
        let out = estimate(&left, &right, &equi_join(JoinType::FullOuter, col(1), col(2)));
        assert!(out.row_count() >= 1000.0);
    }

    #[test]
    fn test_semi_join_bounded_by_probe() {
        let left = side(100.0, col(1), 10.0);
        let right = side(5000.0, col(2), 10.0);
        let out = estimate(&left, &right, &equi_join(JoinType::LeftSemi, col(1), col(2)));
        assert!(out.row_count() <= 100.0);
        // Only the probe side's columns survive.
        assert!(out.find_column(col(1)).is_some());
        assert!(out.find_column(col(2)).is_none());
    }

    #[test]
    fn test_anti_join_complements_semi() {
        let left = side(100.0, col(1), 10.0);
        let right = side(50.0, col(2), 25.0);
        let semi = estimate(&left, &right, &equi_join(JoinType::LeftSemi, col(1), col(2)));
        let anti = estimate(&left, &right, &equi_join(JoinType::LeftAnti, col(1), col(2)));
        assert!((semi.row_count() + anti.row_count() - 100.0).abs() < 1e-9);
        assert!(anti.row_count() >= 0.0);
    }

    #[test]
    fn test_unknown_ndv_uses_default() {
        let mut columns = IndexMap::new();
        columns.insert(col(1), ColumnStatistic::unknown());
        let left = Statistics::new(100.0, columns);
        let right = side(50.0, col(2), 25.0);
        let out = estimate(&left, &right, &equi_join(JoinType::Inner, col(1), col(2)));
        assert!((out.row_count() - 100.0 * 50.0 * DEFAULT_EQUI_SELECTIVITY).abs() < 1e-9);
    }

    #[test]
    fn test_residual_condition_reduces() {
        let left = side(100.0, col(1), 10.0);
        let right = side(50.0, col(2), 25.0);
        let mut join = equi_join(JoinType::Inner, col(1), col(2));
        join.other_conditions.push(ScalarExpr::binary(
            BinaryOp::Gt,
            ScalarExpr::column(col(2)),
            ScalarExpr::literal(Value::Int64(500)),
        ));
        let out = estimate(&left, &right, &join);
        // The residual halves the 200-row inner estimate.
        assert!((out.row_count() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_mark_join_adds_boolean_column() {
        let left = side(100.0, col(1), 10.0);
        let right = side(50.0, col(2), 25.0);
        let mut join = equi_join(JoinType::LeftSemi, col(1), col(2));
        join.mark_column = Some(col(99));
        let without_mark = estimate(&left, &right, &equi_join(JoinType::LeftSemi, col(1), col(2)));
        let out = estimate(&left, &right, &join);
        assert!((out.row_count() - without_mark.row_count()).abs() < 1e-9);
        let mark = out.column_statistic(col(99)).unwrap();
        assert_eq!(mark.ndv, Some(2.0));
        assert_eq!(mark.avg_size_bytes, Some(1.0));
    }

    #[test]
    fn test_multiple_equi_pairs_compose() {
        let mut left_columns = IndexMap::new();
        left_columns.insert(col(1), ColumnStatistic::unknown().with_ndv(10.0));
        left_columns.insert(col(3), ColumnStatistic::unknown().with_ndv(4.0));
        let left = Statistics::new(1000.0, left_columns);
        let mut right_columns = IndexMap::new();
        right_columns.insert(col(2), ColumnStatistic::unknown().with_ndv(20.0));
        right_columns.insert(col(4), ColumnStatistic::unknown().with_ndv(5.0));
        let right = Statistics::new(1000.0, right_columns);
        let join = JoinOp {
            join_type: JoinType::Inner,
            equi_conditions: vec![
                EquiCondition {
                    left: col(1),
                    right: col(2),
                },
                EquiCondition {
                    left: col(3),
                    right: col(4),
                },
            ],
            other_conditions: vec![],
            mark_column: None,
        };
        let out = estimate(&left, &right, &join);
        // 1000 * 1000 / (20 * 5) = 10000.
        assert!((out.row_count() - 10_000.0).abs() < 1e-9);
    }
}
