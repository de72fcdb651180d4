//! Error types for the stagetree framework.
//!
//! Stage handlers report failures through [`StageFailure`], a tagged
//! enumeration the executor switches on to decide whether a failure is
//! contained to the failing subtree or aborts the whole traversal. The
//! result table and its lock report structural and I/O problems through
//! [`TableError`] and [`LockError`].

use crate::table::Axis;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Category of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// User-requested cancellation. Never contained by the executor.
    Interrupted,
    /// A required parameter or environment key is absent.
    MissingArgument,
    /// A required file or resource is absent.
    MissingResource,
    /// Access to a resource was denied.
    PermissionDenied,
    /// Any other failure.
    Other,
}

impl FailureKind {
    /// Returns the category name used in failure records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Interrupted => "Interrupted",
            Self::MissingArgument => "MissingArgument",
            Self::MissingResource => "MissingResource",
            Self::PermissionDenied => "PermissionDenied",
            Self::Other => "Other",
        }
    }

    /// Returns true if the executor contains this failure to the failing subtree.
    #[must_use]
    pub const fn is_recoverable(self) -> bool {
        !matches!(self, Self::Interrupted)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure raised by a stage handler.
#[derive(Debug, Error)]
pub enum StageFailure {
    /// Cancellation requested by the user; aborts the whole traversal.
    #[error("{0}")]
    Interrupted(String),

    /// A required argument is missing.
    #[error("Argument '{0}' is missing in parameters.")]
    MissingArgument(String),

    /// A required file or resource is missing.
    #[error("{0}")]
    MissingResource(String),

    /// Permission was denied.
    #[error("{0}")]
    PermissionDenied(String),

    /// Any uncategorized failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageFailure {
    /// Creates a failure of the given kind with a message.
    ///
    /// For [`FailureKind::MissingArgument`] the message is the missing key.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            FailureKind::Interrupted => Self::Interrupted(message),
            FailureKind::MissingArgument => Self::MissingArgument(message),
            FailureKind::MissingResource => Self::MissingResource(message),
            FailureKind::PermissionDenied => Self::PermissionDenied(message),
            FailureKind::Other => Self::Other(anyhow::Error::msg(message)),
        }
    }

    /// Creates an interrupt failure.
    #[must_use]
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted(reason.into())
    }

    /// Creates a missing argument failure for `key`.
    #[must_use]
    pub fn missing_argument(key: impl Into<String>) -> Self {
        Self::MissingArgument(key.into())
    }

    /// Creates a missing resource failure.
    #[must_use]
    pub fn missing_resource(message: impl Into<String>) -> Self {
        Self::MissingResource(message.into())
    }

    /// Creates a permission failure.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Creates an uncategorized failure from a message.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(anyhow::Error::msg(message.into()))
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Interrupted(_) => FailureKind::Interrupted,
            Self::MissingArgument(_) => FailureKind::MissingArgument,
            Self::MissingResource(_) => FailureKind::MissingResource,
            Self::PermissionDenied(_) => FailureKind::PermissionDenied,
            Self::Other(_) => FailureKind::Other,
        }
    }

    /// Returns the verbose diagnostic context of the failure.
    ///
    /// For uncategorized failures this is the full error chain, including a
    /// backtrace when one was captured.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Other(err) => format!("{err:?}"),
            other => format!("{other:?}"),
        }
    }
}

impl From<io::Error> for StageFailure {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::MissingResource(err.to_string()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Other(err.into()),
        }
    }
}

impl From<TableError> for StageFailure {
    fn from(err: TableError) -> Self {
        match err {
            TableError::Io(io_err) => io_err.into(),
            other => Self::Other(other.into()),
        }
    }
}

/// Error returned from a traversal.
///
/// Only interrupts escape the executor; every other handler failure is
/// contained to the subtree of the failing node.
#[derive(Debug, Clone, Error)]
pub enum TraversalError {
    /// Traversal was interrupted.
    #[error("Traversal interrupted at stage '{stage}': {reason}")]
    Interrupted {
        /// The stage being visited when the interrupt arrived.
        stage: String,
        /// The interrupt reason.
        reason: String,
    },
}

/// Errors raised while building a task tree.
#[derive(Debug, Clone, Error)]
pub enum TreeError {
    /// The parent id does not belong to the tree.
    #[error("Unknown parent node: {parent}")]
    UnknownParent {
        /// The offending parent index.
        parent: usize,
    },

    /// The parent is already at the deepest representable level.
    #[error("Node {parent} is at level {level}; a child cannot be placed below it")]
    LevelOverflow {
        /// The parent index.
        parent: usize,
        /// The parent level.
        level: u32,
    },
}

/// Errors raised while acquiring an exclusive file lock.
#[derive(Debug, Error)]
pub enum LockError {
    /// The sentinel file persisted past the retry budget.
    #[error("Unable to open {} exclusively after {attempts} attempts.", path.display())]
    Unavailable {
        /// The sentinel file path.
        path: PathBuf,
        /// The retry budget that was spent.
        attempts: u32,
    },

    /// The sentinel file could not be created or removed.
    #[error("Lock file {} I/O error: {source}", path.display())]
    Io {
        /// The sentinel file path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Errors raised by the result table.
#[derive(Debug, Error)]
pub enum TableError {
    /// A cell index is outside the table.
    #[error("Cell ({row}, {col}) is outside of the {rows}x{cols} table")]
    IndexOutOfRange {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Table row count.
        rows: usize,
        /// Table column count.
        cols: usize,
    },

    /// The number of names does not match the number of rows or columns.
    #[error("{axis} names list size {actual} does not match the {expected} {axis}s allocated")]
    NameCountMismatch {
        /// The axis being named.
        axis: Axis,
        /// The allocated count.
        expected: usize,
        /// The supplied count.
        actual: usize,
    },

    /// The same name was supplied twice.
    #[error("Duplicate {axis} name '{name}'")]
    DuplicateName {
        /// The axis being named.
        axis: Axis,
        /// The duplicated name.
        name: String,
    },

    /// Names were never assigned for the axis.
    #[error("{axis} names are not set")]
    NamesNotAssigned {
        /// The axis looked up.
        axis: Axis,
    },

    /// The name is not known for the axis.
    #[error("Unknown {axis} name '{name}'")]
    UnknownName {
        /// The axis looked up.
        axis: Axis,
        /// The unknown name.
        name: String,
    },

    /// The backing file has a different number of rows.
    #[error("Table read from the existing file '{}' has different number of rows: {found} instead of {expected}.", path.display())]
    RowCountMismatch {
        /// The backing file.
        path: PathBuf,
        /// Rows found on disk.
        found: usize,
        /// Rows configured.
        expected: usize,
    },

    /// A row of the backing file has a different number of cells.
    #[error("Number of cells mismatch in row={row}, {found} != {expected}")]
    CellCountMismatch {
        /// The row index.
        row: usize,
        /// Cells found on disk.
        found: usize,
        /// Columns configured.
        expected: usize,
    },

    /// A cell value would not read back as exactly one cell.
    #[error("Cell ({row}, {col}) value {value:?} must be non-empty and free of whitespace")]
    UnparsableCell {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The rejected value.
        value: String,
    },

    /// A row or column expression could not be converted to an index.
    #[error("Can't convert '{0}' to an index.")]
    InvalidIndexExpression(String),

    /// The table configuration is invalid.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The lock guarding the backing file could not be acquired.
    #[error("{0}")]
    Lock(#[from] LockError),

    /// An I/O error on the backing file.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised while reading configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration value has the wrong shape.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] serde_json::Error),

    /// A count that must be positive is zero.
    #[error("Configuration key '{key}' must be a positive integer")]
    NonPositive {
        /// The offending key.
        key: &'static str,
    },

    /// The backing file path is empty.
    #[error("Configuration key 'file_path' must not be empty")]
    EmptyPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_names() {
        assert_eq!(FailureKind::MissingArgument.to_string(), "MissingArgument");
        assert_eq!(FailureKind::PermissionDenied.as_str(), "PermissionDenied");
        assert!(!FailureKind::Interrupted.is_recoverable());
        assert!(FailureKind::Other.is_recoverable());
    }

    #[test]
    fn test_missing_argument_message() {
        let failure = StageFailure::missing_argument("corpus_path");
        assert_eq!(failure.kind(), FailureKind::MissingArgument);
        assert_eq!(failure.to_string(), "Argument 'corpus_path' is missing in parameters.");
    }

    #[test]
    fn test_io_error_mapping() {
        let not_found: StageFailure = io::Error::new(io::ErrorKind::NotFound, "no corpus").into();
        assert_eq!(not_found.kind(), FailureKind::MissingResource);

        let denied: StageFailure = io::Error::new(io::ErrorKind::PermissionDenied, "denied").into();
        assert_eq!(denied.kind(), FailureKind::PermissionDenied);

        let other: StageFailure = io::Error::new(io::ErrorKind::InvalidData, "garbage").into();
        assert_eq!(other.kind(), FailureKind::Other);
    }

    #[test]
    fn test_table_error_mapping() {
        let structural: StageFailure = TableError::CellCountMismatch {
            row: 1,
            found: 2,
            expected: 3,
        }
        .into();
        assert_eq!(structural.kind(), FailureKind::Other);
        assert!(structural.to_string().contains("row=1"));

        let missing: StageFailure =
            TableError::Io(io::Error::new(io::ErrorKind::NotFound, "gone")).into();
        assert_eq!(missing.kind(), FailureKind::MissingResource);
    }

    #[test]
    fn test_new_from_kind() {
        for kind in [
            FailureKind::Interrupted,
            FailureKind::MissingArgument,
            FailureKind::MissingResource,
            FailureKind::PermissionDenied,
            FailureKind::Other,
        ] {
            assert_eq!(StageFailure::new(kind, "x").kind(), kind);
        }
    }

    #[test]
    fn test_other_detail_includes_context() {
        let err = anyhow::anyhow!("parser crashed").context("evaluating grammar");
        let failure = StageFailure::from(err);
        let detail = failure.detail();
        assert!(detail.contains("evaluating grammar"));
        assert!(detail.contains("parser crashed"));
    }
}
