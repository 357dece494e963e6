//! Error types shared across Cardo crates.
//!
//! Estimation failures are structural: they indicate bad input (an unbound
//! column, a child whose statistics were never derived), not transient
//! conditions. There is no retry story.

use crate::types::{ColumnId, GroupId};
use thiserror::Error;

/// Errors produced while deriving statistics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A scan references a column whose name cannot be resolved. This is an
    /// upstream binding bug, not an estimation unknown.
    #[error("scan column {column} has no resolvable name")]
    UnboundScanColumn {
        /// The offending column.
        column: ColumnId,
    },

    /// A caller asked for statistics of a column that is not part of the
    /// current output.
    #[error("no statistics recorded for column {column}")]
    ColumnStatisticNotFound {
        /// The column that was looked up.
        column: ColumnId,
    },

    /// A child group was read before its statistics were derived. Children
    /// are estimated before parents by traversal order; hitting this means
    /// the caller violated that precondition.
    #[error("child group {group} has no derived statistics")]
    ChildStatisticsNotDerived {
        /// The underived child group.
        group: GroupId,
    },

    /// A group expression was asked for a child index it does not have.
    #[error("group expression has no child at index {index}")]
    ChildIndexOutOfRange {
        /// The out-of-range index.
        index: usize,
    },
}

/// Result alias used throughout Cardo.
pub type Result<T> = std::result::Result<T, Error>;
