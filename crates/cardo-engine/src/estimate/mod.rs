//! Statistics derivation for group expressions.
//!
//! Derives a [`Statistics`] estimate for one group expression at a time,
//! pulling already-derived child statistics from the memo and writing the
//! result back.
//!
//! ## Submodules
//!
//! - [`expression`] - Column statistics for scalar expressions
//! - [`filter`] - Predicate selectivity and range narrowing
//! - [`join`] - Join cardinality combination

pub mod expression;
pub mod filter;
pub mod join;

use crate::memo::GroupExpression;
use crate::plan::{
    AggregateOp, EmptyOp, GenerateOp, OneRowOp, Operator, ProjectOp, RepeatOp, ScanOp, SetOp,
    WindowOp,
};
use cardo_common::{Error, Result};
use cardo_core::statistics::math::clamp_count;
use cardo_core::{union_column, CatalogStatistics, ColumnStatistic, Statistics};
use indexmap::IndexMap;

/// Fan-out factor of the table-generating-function heuristic.
const GENERATE_FANOUT: f64 = 5.0;

/// Derives statistics for group expressions.
///
/// One instance serves a whole optimization pass; each [`derive`] call is a
/// single synchronous computation. Concurrent calls for sibling expressions
/// are safe: the only shared write, the owning group's cached estimate,
/// goes through the group's guarded compare-and-replace.
///
/// [`derive`]: CardinalityEstimator::derive
pub struct CardinalityEstimator<'a> {
    /// Source of base-table statistics.
    catalog: &'a dyn CatalogStatistics,
    /// Row count assumed for tables the catalog knows nothing about.
    default_row_count: f64,
}

impl<'a> CardinalityEstimator<'a> {
    /// Creates an estimator over the given catalog.
    #[must_use]
    pub fn new(catalog: &'a dyn CatalogStatistics) -> Self {
        Self {
            catalog,
            default_row_count: 1000.0,
        }
    }

    /// Sets the row count assumed for tables without collected statistics.
    #[must_use]
    pub fn with_default_row_count(mut self, rows: f64) -> Self {
        self.default_row_count = rows.max(0.0);
        self
    }

    /// Derives statistics for `gexpr`, records them on the expression, and
    /// updates the owning group's cached estimate if this one is lower.
    ///
    /// Children must already be derived; a missing child estimate fails
    /// fast with [`Error::ChildStatisticsNotDerived`].
    pub fn derive(&self, gexpr: &GroupExpression) -> Result<Statistics> {
        let stats = self.compute(gexpr)?;
        if gexpr.owner_group().update_if_lower(&stats) {
            tracing::debug!(
                "group {} cached statistics lowered to {} rows",
                gexpr.owner_group().id(),
                stats.row_count()
            );
        }
        gexpr.record_statistics(stats.clone());
        tracing::trace!("derived {} rows for group expression", stats.row_count());
        Ok(stats)
    }

    fn compute(&self, gexpr: &GroupExpression) -> Result<Statistics> {
        match gexpr.plan() {
            Operator::Scan(scan) => self.compute_scan(scan),
            Operator::Project(project) => compute_project(gexpr, project),
            Operator::Filter(f) => {
                let child = gexpr.child_statistics(0)?;
                Ok(filter::estimate(&f.predicate, &child))
            }
            Operator::Join(j) => {
                let left = gexpr.child_statistics(0)?;
                let right = gexpr.child_statistics(1)?;
                Ok(join::estimate(&left, &right, j))
            }
            Operator::Aggregate(agg) => compute_aggregate(gexpr, agg),
            Operator::Repeat(repeat) => compute_repeat(gexpr, repeat),
            Operator::OneRow(one_row) => Ok(compute_one_row(one_row)),
            Operator::Empty(empty) => Ok(compute_empty(empty)),
            Operator::Union(op) => compute_union(gexpr, op),
            Operator::Except(op) => compute_except(gexpr, op),
            Operator::Intersect(op) => compute_intersect(gexpr, op),
            Operator::Generate(generate) => compute_generate(gexpr, generate),
            Operator::Window(window) => compute_window(gexpr, window),
            Operator::TableFunction(tvf) => Ok(tvf.function.compute_stats()),
            Operator::Limit(limit) => {
                let child = gexpr.child_statistics(0)?;
                Ok(child.with_row_count(child.row_count().min(limit.limit as f64)))
            }
            Operator::TopN(top_n) => {
                let child = gexpr.child_statistics(0)?;
                Ok(child.with_row_count(child.row_count().min(top_n.limit as f64)))
            }
            Operator::Sort | Operator::Distribute => gexpr.child_statistics(0),
            Operator::AssertRowCount => {
                let child = gexpr.child_statistics(0)?;
                Ok(child.with_row_count(child.row_count().min(1.0)))
            }
        }
    }

    fn compute_scan(&self, scan: &ScanOp) -> Result<Statistics> {
        let mut row_count = self
            .catalog
            .table_row_count(scan.table)
            .unwrap_or(self.default_row_count);
        let mut columns = IndexMap::new();
        for column in &scan.columns {
            let Some(name) = column.name.as_deref() else {
                return Err(Error::UnboundScanColumn { column: column.id });
            };
            let stat = self.catalog.column_statistics(scan.table, name);
            if let Some(count) = stat.count {
                // A collected column count is fresher than the table-level
                // estimate.
                row_count = count;
            }
            columns.insert(column.id, stat);
        }
        Ok(Statistics::new(row_count, columns))
    }
}

fn compute_project(gexpr: &GroupExpression, project: &ProjectOp) -> Result<Statistics> {
    let child = gexpr.child_statistics(0)?;
    let mut columns = IndexMap::new();
    for projection in &project.projections {
        columns.insert(projection.id, expression::estimate(&projection.expr, &child));
    }
    Ok(Statistics::new(child.row_count(), columns).with_penalty(child.penalty()))
}

fn compute_aggregate(gexpr: &GroupExpression, agg: &AggregateOp) -> Result<Statistics> {
    let child = gexpr.child_statistics(0)?;
    // Output cardinality: product of the group-by columns' distinct counts.
    // Columns without a known NDV contribute nothing to the product.
    let mut product = 1.0;
    for expr in &agg.group_by {
        for column in expr.input_columns() {
            if let Some(ndv) = child.find_column(column).and_then(|s| s.ndv) {
                product *= ndv;
            }
        }
    }
    if product <= 0.0 {
        product = 1.0;
    }
    let row_count = product.min(child.row_count());

    let mut columns = IndexMap::new();
    for output in &agg.outputs {
        let stat = expression::estimate(&output.expr, &child).with_ndv(row_count);
        columns.insert(output.id, stat);
    }
    // Aggregation consumes the whole child even though its output is small;
    // the penalty carries that cost into tie-breaking.
    Ok(Statistics::new(row_count, columns)
        .with_penalty(child.penalty() + child.row_count()))
}

fn compute_repeat(gexpr: &GroupExpression, repeat: &RepeatOp) -> Result<Statistics> {
    let child = gexpr.child_statistics(0)?;
    let set_count = repeat.grouping_sets.len() as f64;
    let mut columns = IndexMap::new();
    for (id, stat) in child.column_statistics() {
        let scaled = ColumnStatistic {
            count: stat.count.map(|c| c * set_count),
            num_nulls: stat.num_nulls.map(|n| n * set_count),
            ..stat.clone()
        };
        columns.insert(*id, scaled);
    }
    Ok(Statistics::new(child.row_count() * set_count, columns)
        .with_penalty(child.penalty()))
}

fn compute_one_row(one_row: &OneRowOp) -> Statistics {
    let mut columns = IndexMap::new();
    for projection in &one_row.projections {
        columns.insert(projection.id, ColumnStatistic::unknown().with_ndv(1.0));
    }
    Statistics::new(1.0, columns)
}

fn compute_empty(empty: &EmptyOp) -> Statistics {
    let mut columns = IndexMap::new();
    for column in &empty.columns {
        let stat = ColumnStatistic::unknown()
            .with_ndv(0.0)
            .with_num_nulls(0.0)
            .with_avg_size(0.0);
        columns.insert(*column, stat);
    }
    Statistics::new(0.0, columns)
}

fn compute_union(gexpr: &GroupExpression, op: &SetOp) -> Result<Statistics> {
    let child_count = gexpr.children().len();
    let mut child_stats = Vec::with_capacity(child_count);
    for index in 0..child_count {
        child_stats.push(gexpr.child_statistics(index)?);
    }
    let total_rows: f64 = child_stats.iter().map(Statistics::row_count).sum();

    let mut columns = IndexMap::new();
    for (position, output) in op.outputs.iter().enumerate() {
        let mut running = branch_column(op, &child_stats, 0, position);
        let mut running_rows = child_stats.first().map_or(0.0, Statistics::row_count);
        for branch in 1..child_stats.len() {
            let right = branch_column(op, &child_stats, branch, position);
            running = union_column(&running, running_rows, &right, child_stats[branch].row_count());
            running_rows += child_stats[branch].row_count();
        }
        columns.insert(*output, running);
    }
    Ok(Statistics::new(total_rows, columns))
}

/// The statistic a set-operation branch contributes at an output position.
/// A branch that cannot be mapped contributes the unknown statistic.
fn branch_column(
    op: &SetOp,
    child_stats: &[Statistics],
    branch: usize,
    position: usize,
) -> ColumnStatistic {
    op.child_outputs
        .get(branch)
        .and_then(|columns| columns.get(position))
        .and_then(|id| child_stats.get(branch)?.find_column(*id).cloned())
        .unwrap_or_else(ColumnStatistic::unknown)
}

fn compute_except(gexpr: &GroupExpression, op: &SetOp) -> Result<Statistics> {
    let left = gexpr.child_statistics(0)?;
    let mut columns = IndexMap::new();
    for (position, output) in op.outputs.iter().enumerate() {
        columns.insert(*output, branch_column(op, std::slice::from_ref(&left), 0, position));
    }
    Ok(Statistics::new(left.row_count(), columns))
}

fn compute_intersect(gexpr: &GroupExpression, op: &SetOp) -> Result<Statistics> {
    let child_count = gexpr.children().len();
    let mut child_stats = Vec::with_capacity(child_count);
    for index in 0..child_count {
        child_stats.push(gexpr.child_statistics(index)?);
    }
    if child_stats.is_empty() {
        return Ok(Statistics::new(0.0, IndexMap::new()));
    }
    let mut row_count = child_stats
        .iter()
        .map(Statistics::row_count)
        .fold(f64::INFINITY, f64::min);

    // The output cannot hold more rows than the widest branch's distinct
    // combinations.
    let mut ndv_cap: Option<f64> = None;
    for stats in &child_stats {
        let mut product = 1.0;
        let mut contributed = false;
        for stat in stats.column_statistics().values() {
            if let Some(ndv) = stat.ndv {
                product *= ndv;
                contributed = true;
            }
        }
        if contributed {
            ndv_cap = Some(ndv_cap.map_or(product, |cap| cap.max(product)));
        }
    }
    if let Some(cap) = ndv_cap {
        row_count = row_count.min(cap);
    }

    let mut columns = IndexMap::new();
    for (position, output) in op.outputs.iter().enumerate() {
        columns.insert(*output, branch_column(op, &child_stats, 0, position));
    }
    Ok(Statistics::new(clamp_count(row_count), columns))
}

fn compute_generate(gexpr: &GroupExpression, generate: &GenerateOp) -> Result<Statistics> {
    let child = gexpr.child_statistics(0)?;
    let row_count = child.row_count() * generate.generated.len() as f64 * GENERATE_FANOUT;
    let mut columns = IndexMap::new();
    for (id, stat) in child.column_statistics() {
        columns.insert(*id, stat.clone().with_count(row_count));
    }
    for generated in &generate.generated {
        let stat = ColumnStatistic::unknown()
            .with_count(row_count)
            .with_ndv(row_count)
            .with_num_nulls(0.0)
            .with_avg_size(generated.column_type.width());
        columns.insert(generated.id, stat);
    }
    Ok(Statistics::new(row_count, columns))
}

fn compute_window(gexpr: &GroupExpression, window: &WindowOp) -> Result<Statistics> {
    let child = gexpr.child_statistics(0)?;
    let mut stats = child.clone();
    for window_expr in &window.window_exprs {
        // A window output borrows the statistic of the first referenced
        // input column that has known stats.
        let stat = window_expr
            .expr
            .input_columns()
            .into_iter()
            .find_map(|column| {
                child
                    .find_column(column)
                    .filter(|s| !s.is_unknown())
                    .cloned()
            })
            .unwrap_or_else(ColumnStatistic::unknown);
        stats = stats.with_column(window_expr.id, stat);
    }
    Ok(stats)
}
