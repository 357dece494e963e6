//! Core type definitions for Cardo.
//!
//! This module contains all fundamental types used throughout the estimator:
//! - Identifier types ([`TableId`], [`ColumnId`], [`GroupId`])
//! - Scalar values ([`Value`])
//! - Declared column types ([`ColumnType`])

mod column_type;
mod id;
mod value;

pub use column_type::ColumnType;
pub use id::{ColumnId, GroupId, TableId};
pub use value::Value;
