//! # Cardo
//!
//! A cardinality and selectivity estimation engine for cost-based query
//! optimization.
//!
//! Cardo derives, for every operator instantiation recorded in a memo, a
//! [`Statistics`] estimate: an output row count plus per-column distribution
//! summaries. The surrounding optimizer feeds those estimates into its cost
//! model; Cardo itself never enumerates plans.
//!
//! ## Quick Start
//!
//! ```rust
//! use cardo::{
//!     CardinalityEstimator, ColumnId, ColumnStatistic, Group, GroupExpression, GroupId,
//!     Operator, ScanColumn, ScanOp, StatisticsCache, TableId, TableStatistics,
//! };
//!
//! // Describe what the catalog knows about the table.
//! let catalog = StatisticsCache::new();
//! catalog.add_table(
//!     TableId::new(1),
//!     TableStatistics::new(1000.0)
//!         .with_column("a", ColumnStatistic::unknown().with_ndv(10.0)),
//! );
//!
//! // One scan expression in its own group.
//! let scan = GroupExpression::new(
//!     Operator::Scan(ScanOp {
//!         table: TableId::new(1),
//!         columns: vec![ScanColumn::new(ColumnId::new(1), "a")],
//!     }),
//!     vec![],
//!     Group::new(GroupId::new(1)),
//! );
//!
//! let estimator = CardinalityEstimator::new(&catalog);
//! let stats = estimator.derive(&scan)?;
//! assert_eq!(stats.row_count(), 1000.0);
//! # Ok::<(), cardo::Error>(())
//! ```

// Re-export the estimation API
pub use cardo_engine::estimate::{expression, filter, join};
pub use cardo_engine::plan::{
    self, AggregateOp, EmptyOp, EquiCondition, FilterOp, GenerateOp, GeneratedColumn, JoinOp,
    JoinType, LimitOp, NamedExpr, OneRowOp, Operator, ProjectOp, RepeatOp, ScanColumn, ScanOp,
    SetOp, TableFunction, TableFunctionOp, TopNOp, WindowOp,
};
pub use cardo_engine::{CardinalityEstimator, Group, GroupExpression};

// Re-export the statistic value types and catalog interface
pub use cardo_core::{
    union_column, CatalogStatistics, ColumnStatistic, StatisticRange, Statistics, StatisticsCache,
    TableStatistics,
};

// Re-export core types - you'll need these for ids, values, and errors
pub use cardo_common::{ColumnId, ColumnType, Error, GroupId, Result, TableId, Value};
