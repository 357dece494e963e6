//! Catalog statistics interface.
//!
//! The estimation engine never scans data itself; base-table row counts and
//! per-column summaries come from whatever statistics collection the
//! surrounding system runs. [`CatalogStatistics`] is that boundary, and
//! [`StatisticsCache`] is the in-memory implementation used in tests and by
//! embedders without their own collector.

use crate::statistics::ColumnStatistic;
use cardo_common::TableId;
use hashbrown::HashMap;
use parking_lot::RwLock;

/// Read-only source of base-table statistics.
///
/// Absent data is a value, not an error: an unknown column statistic comes
/// back as [`ColumnStatistic::unknown`], and a table without a collected
/// row count reports `None`.
pub trait CatalogStatistics: Send + Sync {
    /// The collected row count of a table, if any.
    fn table_row_count(&self, table: TableId) -> Option<f64>;

    /// The collected statistic for a named column of a table.
    fn column_statistics(&self, table: TableId, column: &str) -> ColumnStatistic;
}

/// Collected statistics for one table.
#[derive(Debug, Clone, Default)]
pub struct TableStatistics {
    /// Total number of rows, if collected.
    pub row_count: Option<f64>,
    /// Column statistics keyed by column name.
    pub columns: HashMap<String, ColumnStatistic>,
}

impl TableStatistics {
    /// Creates table statistics with a known row count.
    #[must_use]
    pub fn new(row_count: f64) -> Self {
        Self {
            row_count: Some(row_count.max(0.0)),
            columns: HashMap::new(),
        }
    }

    /// Creates table statistics with no collected row count.
    #[must_use]
    pub fn uncollected() -> Self {
        Self::default()
    }

    /// Adds column statistics.
    #[must_use]
    pub fn with_column(mut self, name: &str, stats: ColumnStatistic) -> Self {
        self.columns.insert(name.to_string(), stats);
        self
    }
}

/// Thread-safe in-memory statistics cache.
#[derive(Debug, Default)]
pub struct StatisticsCache {
    tables: RwLock<HashMap<TableId, TableStatistics>>,
}

impl StatisticsCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the statistics for a table.
    pub fn add_table(&self, table: TableId, stats: TableStatistics) {
        self.tables.write().insert(table, stats);
    }

    /// Drops the statistics for a table.
    pub fn remove_table(&self, table: TableId) {
        self.tables.write().remove(&table);
    }
}

impl CatalogStatistics for StatisticsCache {
    fn table_row_count(&self, table: TableId) -> Option<f64> {
        self.tables.read().get(&table)?.row_count
    }

    fn column_statistics(&self, table: TableId, column: &str) -> ColumnStatistic {
        self.tables
            .read()
            .get(&table)
            .and_then(|t| t.columns.get(column))
            .cloned()
            .unwrap_or_else(ColumnStatistic::unknown)
    }
}
