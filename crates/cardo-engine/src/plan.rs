//! Plan operator representation.
//!
//! Operators here are the estimation-facing view of the optimizer's plan
//! nodes: one variant per operator kind, carrying only the accessors the
//! derivation rules read. Children are not embedded; a memo group
//! expression owns its child groups, and the dispatcher pulls child
//! statistics from there.

use cardo_common::{ColumnId, ColumnType, TableId, Value};
use cardo_core::Statistics;
use std::fmt;
use std::sync::Arc;

/// A scalar expression appearing in a predicate or projection.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    /// Reference to an input column.
    Column(ColumnId),
    /// A literal value.
    Literal(Value),
    /// A unary operation.
    Unary {
        /// The operation.
        op: UnaryOp,
        /// The operand.
        operand: Box<ScalarExpr>,
    },
    /// A binary operation.
    Binary {
        /// The operation.
        op: BinaryOp,
        /// Left operand.
        left: Box<ScalarExpr>,
        /// Right operand.
        right: Box<ScalarExpr>,
    },
    /// An opaque function call. The estimator makes no attempt to see
    /// through these.
    Function {
        /// Function name, for display only.
        name: String,
        /// Argument expressions.
        args: Vec<ScalarExpr>,
    },
}

impl ScalarExpr {
    /// Convenience constructor for a column reference.
    #[must_use]
    pub fn column(id: ColumnId) -> Self {
        ScalarExpr::Column(id)
    }

    /// Convenience constructor for a literal.
    #[must_use]
    pub fn literal(value: Value) -> Self {
        ScalarExpr::Literal(value)
    }

    /// Convenience constructor for a binary operation.
    #[must_use]
    pub fn binary(op: BinaryOp, left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Convenience constructor for a unary operation.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: ScalarExpr) -> Self {
        ScalarExpr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// The column this expression directly references, if it is a bare
    /// column reference.
    #[must_use]
    pub fn as_column(&self) -> Option<ColumnId> {
        match self {
            ScalarExpr::Column(id) => Some(*id),
            _ => None,
        }
    }

    /// All input columns referenced by this expression, in first-appearance
    /// order, without duplicates.
    #[must_use]
    pub fn input_columns(&self) -> Vec<ColumnId> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut Vec<ColumnId>) {
        match self {
            ScalarExpr::Column(id) => {
                if !out.contains(id) {
                    out.push(*id);
                }
            }
            ScalarExpr::Literal(_) => {}
            ScalarExpr::Unary { operand, .. } => operand.collect_columns(out),
            ScalarExpr::Binary { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            ScalarExpr::Function { args, .. } => {
                for arg in args {
                    arg.collect_columns(out);
                }
            }
        }
    }
}

/// A unary scalar operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation.
    Not,
    /// Arithmetic negation.
    Neg,
    /// NULL test.
    IsNull,
    /// Non-NULL test.
    IsNotNull,
}

/// A binary scalar operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
}

impl BinaryOp {
    /// Whether this is a comparison against the value domain.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

/// An output expression with the column identity it is bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedExpr {
    /// Output column identity.
    pub id: ColumnId,
    /// The computed expression.
    pub expr: ScalarExpr,
}

impl NamedExpr {
    /// Binds an expression to an output column.
    #[must_use]
    pub fn new(id: ColumnId, expr: ScalarExpr) -> Self {
        Self { id, expr }
    }
}

/// Join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// Inner join.
    Inner,
    /// Cross product.
    Cross,
    /// Left outer join.
    LeftOuter,
    /// Right outer join.
    RightOuter,
    /// Full outer join.
    FullOuter,
    /// Left semi join: left rows with at least one match.
    LeftSemi,
    /// Right semi join.
    RightSemi,
    /// Left anti join: left rows with no match.
    LeftAnti,
    /// Right anti join.
    RightAnti,
}

impl JoinType {
    /// Whether only one side's columns survive into the output.
    #[must_use]
    pub fn is_semi_or_anti(self) -> bool {
        matches!(
            self,
            JoinType::LeftSemi | JoinType::RightSemi | JoinType::LeftAnti | JoinType::RightAnti
        )
    }
}

/// One `left = right` equi-join pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquiCondition {
    /// Column from the left input.
    pub left: ColumnId,
    /// Column from the right input.
    pub right: ColumnId,
}

/// A plan operator, one variant per kind the estimator knows how to derive
/// statistics for.
#[derive(Debug, Clone)]
pub enum Operator {
    /// Scan a base table.
    Scan(ScanOp),

    /// Project output expressions.
    Project(ProjectOp),

    /// Filter rows by a predicate.
    Filter(FilterOp),

    /// Join the two child groups.
    Join(JoinOp),

    /// Grouped aggregation.
    Aggregate(AggregateOp),

    /// Grouping-sets repeat: replays the input once per grouping set.
    Repeat(RepeatOp),

    /// Relation producing exactly one row.
    OneRow(OneRowOp),

    /// Relation producing no rows.
    Empty(EmptyOp),

    /// Union-all of the child groups.
    Union(SetOp),

    /// Left child minus the remaining children.
    Except(SetOp),

    /// Intersection of the child groups.
    Intersect(SetOp),

    /// Table-generating function applied laterally to each input row.
    Generate(GenerateOp),

    /// Window functions over the input.
    Window(WindowOp),

    /// Table-valued-function relation with its own statistics contract.
    TableFunction(TableFunctionOp),

    /// Limit the number of rows.
    Limit(LimitOp),

    /// Sorted limit.
    TopN(TopNOp),

    /// Sort (row count and statistics pass through).
    Sort,

    /// Runtime row-count assertion (scalar subquery guard).
    AssertRowCount,

    /// Exchange / redistribution (statistics pass through).
    Distribute,
}

/// Scan of a base table.
#[derive(Debug, Clone)]
pub struct ScanOp {
    /// The table being scanned.
    pub table: TableId,
    /// Output columns of the scan.
    pub columns: Vec<ScanColumn>,
}

/// One output column of a scan.
#[derive(Debug, Clone)]
pub struct ScanColumn {
    /// Output column identity.
    pub id: ColumnId,
    /// Catalog name of the column. `None` marks an upstream binding bug
    /// and fails the scan estimation.
    pub name: Option<String>,
}

impl ScanColumn {
    /// A named scan column.
    #[must_use]
    pub fn new(id: ColumnId, name: &str) -> Self {
        Self {
            id,
            name: Some(name.to_string()),
        }
    }
}

/// Projection of output expressions.
#[derive(Debug, Clone)]
pub struct ProjectOp {
    /// The output expressions.
    pub projections: Vec<NamedExpr>,
}

/// Row filter.
#[derive(Debug, Clone)]
pub struct FilterOp {
    /// The boolean predicate.
    pub predicate: ScalarExpr,
}

/// Join of two inputs.
#[derive(Debug, Clone)]
pub struct JoinOp {
    /// Join kind.
    pub join_type: JoinType,
    /// Equi-join column pairs.
    pub equi_conditions: Vec<EquiCondition>,
    /// Residual non-equi predicates over the joined row.
    pub other_conditions: Vec<ScalarExpr>,
    /// Mark-join output column, if this is a mark variant.
    pub mark_column: Option<ColumnId>,
}

/// Grouped aggregation.
#[derive(Debug, Clone)]
pub struct AggregateOp {
    /// Group-by expressions.
    pub group_by: Vec<ScalarExpr>,
    /// Output expressions (keys and aggregate functions).
    pub outputs: Vec<NamedExpr>,
}

/// Grouping-sets repeat.
#[derive(Debug, Clone)]
pub struct RepeatOp {
    /// The grouping sets; only their number matters for estimation.
    pub grouping_sets: Vec<Vec<ColumnId>>,
}

/// One-row relation.
#[derive(Debug, Clone)]
pub struct OneRowOp {
    /// The projected expressions.
    pub projections: Vec<NamedExpr>,
}

/// Empty relation.
#[derive(Debug, Clone)]
pub struct EmptyOp {
    /// The projected output columns.
    pub columns: Vec<ColumnId>,
}

/// Set operation over two or more child groups.
#[derive(Debug, Clone)]
pub struct SetOp {
    /// Output column identities, positional.
    pub outputs: Vec<ColumnId>,
    /// Each child's output columns, positional, parallel to the child
    /// groups of the owning group expression.
    pub child_outputs: Vec<Vec<ColumnId>>,
}

/// Table-generating function (lateral explode).
#[derive(Debug, Clone)]
pub struct GenerateOp {
    /// The freshly generated output columns.
    pub generated: Vec<GeneratedColumn>,
}

/// One generated output column with its declared type.
#[derive(Debug, Clone)]
pub struct GeneratedColumn {
    /// Output column identity.
    pub id: ColumnId,
    /// Declared type, source of the column's width.
    pub column_type: ColumnType,
}

/// Window functions.
#[derive(Debug, Clone)]
pub struct WindowOp {
    /// The window expressions with their output columns.
    pub window_exprs: Vec<NamedExpr>,
}

/// Table-valued-function relation.
///
/// Statistics derivation is delegated entirely to the function itself.
#[derive(Clone)]
pub struct TableFunctionOp {
    /// The function implementation.
    pub function: Arc<dyn TableFunction>,
}

impl fmt::Debug for TableFunctionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableFunctionOp")
            .field("function", &self.function.name())
            .finish()
    }
}

/// Contract a table-valued function fulfills to describe its own output.
pub trait TableFunction: Send + Sync {
    /// Function name, for display.
    fn name(&self) -> &str;

    /// The function's own statistics estimate.
    fn compute_stats(&self) -> Statistics;
}

/// Row limit.
#[derive(Debug, Clone)]
pub struct LimitOp {
    /// Maximum number of rows.
    pub limit: u64,
}

/// Sorted row limit.
#[derive(Debug, Clone)]
pub struct TopNOp {
    /// Maximum number of rows.
    pub limit: u64,
}
