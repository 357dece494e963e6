//! Statistics estimation for boolean filter predicates.
//!
//! Selectivity comes from per-comparison range narrowing under a uniformity
//! assumption. Conjuncts compose multiplicatively, assuming independence;
//! disjuncts recombine by inclusion-style addition. Shapes the estimator
//! does not understand pass input statistics through unchanged.

use crate::plan::{BinaryOp, ScalarExpr, UnaryOp};
use cardo_common::{ColumnId, Value};
use cardo_core::statistics::math::{clamp_count, clamp_selectivity, max_non_nan};
use cardo_core::{ColumnStatistic, StatisticRange, Statistics};

/// Selectivity of an equality whose column has no usable distinct count.
pub(crate) const DEFAULT_EQUALITY_SELECTIVITY: f64 = 0.1;
/// Selectivity of a range comparison whose column has no usable bounds.
pub(crate) const DEFAULT_RANGE_SELECTIVITY: f64 = 1.0 / 3.0;
/// Assumed fraction of NULL rows when the column's null count is unknown.
pub(crate) const DEFAULT_NULL_FRACTION: f64 = 0.05;

/// Estimates the statistics surviving `predicate` over rows described by
/// `input`. The output carries the same column set with ranges narrowed and
/// the row count reduced; it never exceeds the input row count and is never
/// negative or NaN.
#[must_use]
pub fn estimate(predicate: &ScalarExpr, input: &Statistics) -> Statistics {
    match predicate {
        ScalarExpr::Binary {
            op: BinaryOp::And,
            left,
            right,
        } => {
            // Each conjunct narrows the statistics the next one sees;
            // selectivities compose multiplicatively.
            let narrowed = estimate(left, input);
            estimate(right, &narrowed)
        }
        ScalarExpr::Binary {
            op: BinaryOp::Or,
            left,
            right,
        } => estimate_disjunction(left, right, input),
        ScalarExpr::Binary { op, left, right } if op.is_comparison() => {
            estimate_comparison(*op, left, right, input)
        }
        ScalarExpr::Unary {
            op: UnaryOp::Not,
            operand,
        } => {
            let kept = estimate(operand, input);
            input.with_row_count(clamp_count(input.row_count() - kept.row_count()))
        }
        ScalarExpr::Unary {
            op: UnaryOp::IsNull,
            operand,
        } => estimate_is_null(operand, input),
        ScalarExpr::Unary {
            op: UnaryOp::IsNotNull,
            operand,
        } => estimate_is_not_null(operand, input),
        ScalarExpr::Literal(Value::Bool(true)) => input.clone(),
        ScalarExpr::Literal(Value::Bool(false)) => input.with_row_count(0.0),
        // Unsupported shapes select everything.
        _ => input.clone(),
    }
}

fn estimate_comparison(
    op: BinaryOp,
    left: &ScalarExpr,
    right: &ScalarExpr,
    input: &Statistics,
) -> Statistics {
    match (left, right) {
        (ScalarExpr::Column(a), ScalarExpr::Column(b)) if op == BinaryOp::Eq => {
            estimate_column_equality(*a, *b, input)
        }
        (ScalarExpr::Column(column), ScalarExpr::Literal(value)) => {
            estimate_column_versus_literal(op, *column, value, input)
        }
        (ScalarExpr::Literal(value), ScalarExpr::Column(column)) => {
            estimate_column_versus_literal(flip(op), *column, value, input)
        }
        _ => input.clone(),
    }
}

/// Mirrors a comparison so the column is on the left.
fn flip(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Le => BinaryOp::Ge,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::Ge => BinaryOp::Le,
        other => other,
    }
}

fn estimate_column_versus_literal(
    op: BinaryOp,
    column: ColumnId,
    value: &Value,
    input: &Statistics,
) -> Statistics {
    let Some(stat) = input.find_column(column) else {
        return input.clone();
    };
    let stat = stat.clone();
    let rows = input.row_count();
    let (selectivity, narrowed) = match op {
        BinaryOp::Eq => equality_narrowing(&stat, value),
        BinaryOp::Ne => inequality_narrowing(&stat, value),
        BinaryOp::Lt | BinaryOp::Le => range_narrowing(&stat, None, value.as_numeric()),
        BinaryOp::Gt | BinaryOp::Ge => range_narrowing(&stat, value.as_numeric(), None),
        _ => (1.0, stat.clone()),
    };
    let new_rows = clamp_count(rows * clamp_selectivity(selectivity)).min(rows);
    input
        .with_row_count(new_rows)
        .with_column(column, narrowed.with_count(new_rows))
}

/// Equality against a constant: one value out of `ndv` survives.
fn equality_narrowing(stat: &ColumnStatistic, value: &Value) -> (f64, ColumnStatistic) {
    let range = StatisticRange::from_column(stat);
    if let Some(v) = value.as_numeric() {
        if range.is_bounded() && !range.contains(v) {
            // Provably selects nothing.
            let narrowed = stat
                .clone()
                .with_ndv(0.0)
                .with_num_nulls(0.0)
                .with_range(v, v);
            return (0.0, narrowed);
        }
        let selectivity = match stat.ndv {
            Some(ndv) => 1.0 / max_non_nan(1.0, ndv),
            None => DEFAULT_EQUALITY_SELECTIVITY,
        };
        let narrowed = stat
            .clone()
            .with_ndv(1.0)
            .with_num_nulls(0.0)
            .with_range(v, v);
        return (selectivity, narrowed);
    }
    // Non-numeric constant: the NDV argument still applies, the range
    // cannot be narrowed.
    let selectivity = match stat.ndv {
        Some(ndv) => 1.0 / max_non_nan(1.0, ndv),
        None => DEFAULT_EQUALITY_SELECTIVITY,
    };
    (selectivity, stat.clone().with_ndv(1.0).with_num_nulls(0.0))
}

fn inequality_narrowing(stat: &ColumnStatistic, _value: &Value) -> (f64, ColumnStatistic) {
    let selectivity = match stat.ndv {
        Some(ndv) => 1.0 - 1.0 / max_non_nan(1.0, ndv),
        None => 1.0 - DEFAULT_EQUALITY_SELECTIVITY,
    };
    let narrowed = match stat.ndv {
        Some(ndv) => stat.clone().with_ndv((ndv - 1.0).max(0.0)).with_num_nulls(0.0),
        None => stat.clone().with_num_nulls(0.0),
    };
    (selectivity, narrowed)
}

/// Range comparison: the implied half-open interval intersects the column's
/// range, and the covered fraction of the original density is the
/// selectivity.
fn range_narrowing(
    stat: &ColumnStatistic,
    implied_low: Option<f64>,
    implied_high: Option<f64>,
) -> (f64, ColumnStatistic) {
    let range = StatisticRange::from_column(stat);
    let implied = StatisticRange::new(implied_low, implied_high, None);
    let narrowed_range = range.intersect(&implied);
    let selectivity = range
        .overlap_fraction(&implied)
        .unwrap_or(DEFAULT_RANGE_SELECTIVITY);
    let mut narrowed = stat.clone().with_num_nulls(0.0);
    narrowed.min_value = narrowed_range.low;
    narrowed.max_value = narrowed_range.high;
    narrowed.ndv = match narrowed_range.distinct {
        Some(d) => Some(d),
        None => stat.ndv.map(|ndv| clamp_count(ndv * selectivity)),
    };
    (selectivity, narrowed)
}

/// Equality between two columns of the same input (a join-like predicate
/// outside a join node).
fn estimate_column_equality(a: ColumnId, b: ColumnId, input: &Statistics) -> Statistics {
    let ndv_a = input.find_column(a).and_then(|s| s.ndv);
    let ndv_b = input.find_column(b).and_then(|s| s.ndv);
    let selectivity = match (ndv_a, ndv_b) {
        (Some(x), Some(y)) => 1.0 / max_non_nan(1.0, x.max(y)),
        (Some(x), None) | (None, Some(x)) => 1.0 / max_non_nan(1.0, x),
        (None, None) => DEFAULT_EQUALITY_SELECTIVITY,
    };
    let rows = input.row_count();
    input.with_row_count(clamp_count(rows * selectivity).min(rows))
}

/// Disjuncts are estimated independently against the original input, then
/// recombined: ranges through union, row counts by inclusion-exclusion
/// capped at the input population.
fn estimate_disjunction(left: &ScalarExpr, right: &ScalarExpr, input: &Statistics) -> Statistics {
    let left_est = estimate(left, input);
    let right_est = estimate(right, input);
    let rows = input.row_count();
    let r1 = left_est.row_count();
    let r2 = right_est.row_count();
    let combined = clamp_count(r1 + r2 - r1 * r2 / max_non_nan(1.0, rows)).min(rows);

    let mut result = input.with_row_count(combined);
    for (id, original) in input.column_statistics() {
        let l = left_est.find_column(*id).unwrap_or(original);
        let r = right_est.find_column(*id).unwrap_or(original);
        let merged_range =
            StatisticRange::from_column(l).union(&StatisticRange::from_column(r));
        let mut merged = original.clone().with_count(combined);
        merged.min_value = merged_range.low;
        merged.max_value = merged_range.high;
        merged.ndv = merged_range.distinct;
        merged.num_nulls = match (l.num_nulls, r.num_nulls) {
            (Some(x), Some(y)) => Some(x.max(y)),
            (Some(x), None) | (None, Some(x)) => Some(x),
            (None, None) => None,
        };
        result = result.with_column(*id, merged);
    }
    result
}

fn estimate_is_null(operand: &ScalarExpr, input: &Statistics) -> Statistics {
    let Some(column) = operand.as_column() else {
        return input.clone();
    };
    let Some(stat) = input.find_column(column).cloned() else {
        return input.clone();
    };
    let rows = input.row_count();
    let new_rows = match stat.num_nulls {
        Some(nulls) => nulls.min(rows),
        None => rows * DEFAULT_NULL_FRACTION,
    };
    let narrowed = stat
        .with_count(new_rows)
        .with_ndv(0.0)
        .with_num_nulls(new_rows)
        .with_unknown_range();
    input
        .with_row_count(new_rows)
        .with_column(column, narrowed)
}

fn estimate_is_not_null(operand: &ScalarExpr, input: &Statistics) -> Statistics {
    let Some(column) = operand.as_column() else {
        return input.clone();
    };
    let Some(stat) = input.find_column(column).cloned() else {
        return input.clone();
    };
    let rows = input.row_count();
    let new_rows = match stat.num_nulls {
        Some(nulls) => clamp_count(rows - nulls),
        None => rows * (1.0 - DEFAULT_NULL_FRACTION),
    };
    let narrowed = stat.with_count(new_rows).with_num_nulls(0.0);
    input
        .with_row_count(new_rows)
        .with_column(column, narrowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardo_common::ColumnId;
    use indexmap::IndexMap;

    fn col(id: u64) -> ColumnId {
        ColumnId::new(id)
    }

    fn input() -> Statistics {
        let mut columns = IndexMap::new();
        columns.insert(
            col(1),
            ColumnStatistic::unknown()
                .with_count(1000.0)
                .with_ndv(10.0)
                .with_num_nulls(0.0)
                .with_range(0.0, 100.0)
                .with_avg_size(8.0),
        );
        columns.insert(
            col(2),
            ColumnStatistic::unknown()
                .with_count(1000.0)
                .with_ndv(50.0)
                .with_num_nulls(100.0)
                .with_range(0.0, 1000.0)
                .with_avg_size(8.0),
        );
        Statistics::new(1000.0, columns)
    }

    fn eq(column: ColumnId, value: i64) -> ScalarExpr {
        ScalarExpr::binary(
            BinaryOp::Eq,
            ScalarExpr::column(column),
            ScalarExpr::literal(Value::Int64(value)),
        )
    }

    #[test]
    fn test_equality_uses_ndv() {
        let out = estimate(&eq(col(1), 5), &input());
        // 1000 rows, ndv 10: one value's share is 100 rows.
        assert!((out.row_count() - 100.0).abs() < 1e-9);
        let stat = out.column_statistic(col(1)).unwrap();
        assert_eq!(stat.ndv, Some(1.0));
        assert_eq!(stat.min_value, Some(5.0));
        assert_eq!(stat.max_value, Some(5.0));
    }

    #[test]
    fn test_equality_outside_range_selects_nothing() {
        let out = estimate(&eq(col(1), 500), &input());
        assert!((out.row_count()).abs() < 1e-9);
    }

    #[test]
    fn test_range_comparison_narrows() {
        let gt = ScalarExpr::binary(
            BinaryOp::Gt,
            ScalarExpr::column(col(1)),
            ScalarExpr::literal(Value::Int64(50)),
        );
        let out = estimate(&gt, &input());
        // Half of the [0, 100] domain survives.
        assert!((out.row_count() - 500.0).abs() < 1e-9);
        let stat = out.column_statistic(col(1)).unwrap();
        assert_eq!(stat.min_value, Some(50.0));
        assert_eq!(stat.max_value, Some(100.0));
        assert!((stat.ndv.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_literal_on_left_is_mirrored() {
        // 50 < a  ==  a > 50
        let lt = ScalarExpr::binary(
            BinaryOp::Lt,
            ScalarExpr::literal(Value::Int64(50)),
            ScalarExpr::column(col(1)),
        );
        let out = estimate(&lt, &input());
        assert!((out.row_count() - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_conjunction_composes_multiplicatively() {
        let both = ScalarExpr::binary(
            BinaryOp::And,
            ScalarExpr::binary(
                BinaryOp::Gt,
                ScalarExpr::column(col(1)),
                ScalarExpr::literal(Value::Int64(50)),
            ),
            eq(col(2), 7),
        );
        let out = estimate(&both, &input());
        // 1000 * 0.5 * (1/50) = 10.
        assert!((out.row_count() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_conjunction_narrows_sequentially() {
        // Second conjunct sees the range already narrowed by the first:
        // a > 50 leaves [50, 100] with ndv 5, so a = 75 selects 1/5.
        let both = ScalarExpr::binary(
            BinaryOp::And,
            ScalarExpr::binary(
                BinaryOp::Gt,
                ScalarExpr::column(col(1)),
                ScalarExpr::literal(Value::Int64(50)),
            ),
            eq(col(1), 75),
        );
        let out = estimate(&both, &input());
        assert!((out.row_count() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjunction_capped_at_input() {
        let either = ScalarExpr::binary(
            BinaryOp::Or,
            ScalarExpr::binary(
                BinaryOp::Le,
                ScalarExpr::column(col(1)),
                ScalarExpr::literal(Value::Int64(100)),
            ),
            ScalarExpr::binary(
                BinaryOp::Ge,
                ScalarExpr::column(col(1)),
                ScalarExpr::literal(Value::Int64(0)),
            ),
        );
        let out = estimate(&either, &input());
        assert!(out.row_count() <= 1000.0 + 1e-9);
    }

    #[test]
    fn test_disjunction_inclusion_exclusion() {
        let either = ScalarExpr::binary(BinaryOp::Or, eq(col(1), 5), eq(col(1), 50));
        let out = estimate(&either, &input());
        // 100 + 100 - 100*100/1000 = 190.
        assert!((out.row_count() - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjunction_unions_ranges() {
        let either = ScalarExpr::binary(BinaryOp::Or, eq(col(1), 10), eq(col(1), 90));
        let out = estimate(&either, &input());
        let stat = out.column_statistic(col(1)).unwrap();
        assert_eq!(stat.min_value, Some(10.0));
        assert_eq!(stat.max_value, Some(90.0));
    }

    #[test]
    fn test_column_equality_uses_larger_ndv() {
        let pred = ScalarExpr::binary(
            BinaryOp::Eq,
            ScalarExpr::column(col(1)),
            ScalarExpr::column(col(2)),
        );
        let out = estimate(&pred, &input());
        // 1 / max(10, 50) of 1000 rows.
        assert!((out.row_count() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_not_complements() {
        let not = ScalarExpr::unary(UnaryOp::Not, eq(col(1), 5));
        let out = estimate(&not, &input());
        assert!((out.row_count() - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_is_null_uses_null_count() {
        let pred = ScalarExpr::unary(UnaryOp::IsNull, ScalarExpr::column(col(2)));
        let out = estimate(&pred, &input());
        assert!((out.row_count() - 100.0).abs() < 1e-9);
        let stat = out.column_statistic(col(2)).unwrap();
        assert_eq!(stat.ndv, Some(0.0));
    }

    #[test]
    fn test_is_not_null_complements() {
        let pred = ScalarExpr::unary(UnaryOp::IsNotNull, ScalarExpr::column(col(2)));
        let out = estimate(&pred, &input());
        assert!((out.row_count() - 900.0).abs() < 1e-9);
        let stat = out.column_statistic(col(2)).unwrap();
        assert_eq!(stat.num_nulls, Some(0.0));
    }

    #[test]
    fn test_unknown_column_stat_uses_defaults() {
        let mut columns = IndexMap::new();
        columns.insert(col(1), ColumnStatistic::unknown());
        let stats = Statistics::new(1000.0, columns);
        let out = estimate(&eq(col(1), 5), &stats);
        assert!((out.row_count() - 1000.0 * DEFAULT_EQUALITY_SELECTIVITY).abs() < 1e-9);
        let gt = ScalarExpr::binary(
            BinaryOp::Gt,
            ScalarExpr::column(col(1)),
            ScalarExpr::literal(Value::Int64(0)),
        );
        let out = estimate(&gt, &stats);
        assert!((out.row_count() - 1000.0 * DEFAULT_RANGE_SELECTIVITY).abs() < 1e-9);
    }

    #[test]
    fn test_opaque_predicate_passes_through() {
        let pred = ScalarExpr::Function {
            name: "like".to_string(),
            args: vec![ScalarExpr::column(col(1))],
        };
        let out = estimate(&pred, &input());
        assert_eq!(out, input());
    }

    #[test]
    fn test_false_literal_selects_nothing() {
        let out = estimate(&ScalarExpr::literal(Value::Bool(false)), &input());
        assert!((out.row_count()).abs() < f64::EPSILON);
        let out = estimate(&ScalarExpr::literal(Value::Bool(true)), &input());
        assert!((out.row_count() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_output_never_exceeds_input() {
        let preds = [
            eq(col(1), 5),
            ScalarExpr::unary(UnaryOp::Not, eq(col(1), 5)),
            ScalarExpr::binary(BinaryOp::Or, eq(col(1), 5), eq(col(2), 7)),
            ScalarExpr::unary(UnaryOp::IsNull, ScalarExpr::column(col(2))),
            ScalarExpr::unary(UnaryOp::IsNotNull, ScalarExpr::column(col(2))),
        ];
        for pred in preds {
            let out = estimate(&pred, &input());
            assert!(out.row_count() <= 1000.0 + 1e-9);
            assert!(out.row_count() >= 0.0);
            assert!(out.row_count().is_finite());
        }
    }
}
