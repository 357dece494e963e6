//! Column-statistic estimation for scalar expressions.

use crate::plan::{BinaryOp, ScalarExpr, UnaryOp};
use cardo_core::{ColumnStatistic, Statistics};
use cardo_common::Value;

/// Derives a [`ColumnStatistic`] for a scalar expression evaluated against
/// rows described by `input`.
///
/// The estimator is total: a shape it cannot reason about yields
/// [`ColumnStatistic::unknown`], never an error.
#[must_use]
pub fn estimate(expr: &ScalarExpr, input: &Statistics) -> ColumnStatistic {
    match expr {
        ScalarExpr::Column(id) => input
            .find_column(*id)
            .cloned()
            .unwrap_or_else(ColumnStatistic::unknown),
        ScalarExpr::Literal(value) => estimate_literal(value),
        ScalarExpr::Unary {
            op: UnaryOp::Neg,
            operand,
        } => negate(estimate(operand, input)),
        ScalarExpr::Binary {
            op: op @ (BinaryOp::Add | BinaryOp::Sub),
            left,
            right,
        } => combine_additive(*op, estimate(left, input), estimate(right, input)),
        // Predicates, multiplicative arithmetic, and opaque functions are
        // not estimated.
        _ => ColumnStatistic::unknown(),
    }
}

fn estimate_literal(value: &Value) -> ColumnStatistic {
    let stat = ColumnStatistic::unknown()
        .with_count(1.0)
        .with_ndv(1.0)
        .with_num_nulls(if value.is_null() { 1.0 } else { 0.0 })
        .with_avg_size(value.size_bytes());
    match value.as_numeric() {
        Some(v) => stat.with_range(v, v),
        None => stat,
    }
}

fn negate(inner: ColumnStatistic) -> ColumnStatistic {
    if inner.is_unknown() {
        return inner;
    }
    ColumnStatistic {
        min_value: inner.max_value.map(|v| -v),
        max_value: inner.min_value.map(|v| -v),
        ..inner
    }
}

/// Combines bounds for `+` / `-`. The distinct count of the result is the
/// larger operand's; null counts add.
fn combine_additive(
    op: BinaryOp,
    left: ColumnStatistic,
    right: ColumnStatistic,
) -> ColumnStatistic {
    if left.is_unknown() || right.is_unknown() {
        return ColumnStatistic::unknown();
    }
    let (min_value, max_value) = match op {
        BinaryOp::Add => (
            combine_bound(left.min_value, right.min_value),
            combine_bound(left.max_value, right.max_value),
        ),
        _ => (
            combine_bound(left.min_value, right.max_value.map(|v| -v)),
            combine_bound(left.max_value, right.min_value.map(|v| -v)),
        ),
    };
    ColumnStatistic {
        count: opt_join(left.count, right.count, f64::max),
        ndv: opt_join(left.ndv, right.ndv, f64::max),
        num_nulls: match (left.num_nulls, right.num_nulls) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        },
        min_value,
        max_value,
        avg_size_bytes: opt_join(left.avg_size_bytes, right.avg_size_bytes, f64::max),
    }
}

fn combine_bound(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        _ => None,
    }
}

fn opt_join(a: Option<f64>, b: Option<f64>, merge: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(merge(x, y)),
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}
