//! Shared tabular result store.
//!
//! This module provides:
//! - An advisory, sentinel-file based exclusive lock
//! - A file-backed result matrix with merge-on-write flushing
//! - A dashboard component exposing the matrix to pipeline stages
//!
//! The on-disk format is plain text: one row per line, cells joined by
//! tabs, unset cells written as `N/A`. The merge reader splits lines on any
//! whitespace, so empty values and values containing whitespace are
//! rejected when a cell is set.

mod component;
mod config;
mod lock;
mod result_table;

use std::fmt;

pub use component::{format_value, parse_index, TableComponent};
pub use config::{HeaderCell, TableConfig};
pub use lock::{ScopedLock, DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_DELAY};
pub use result_table::{parse_rows, ResultTable};

/// Text written for unset cells.
pub const UNSET_MARKER: &str = "N/A";

/// A table axis, used in name lookups and their errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Rows.
    Row,
    /// Columns.
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row => f.write_str("row"),
            Self::Column => f.write_str("column"),
        }
    }
}
