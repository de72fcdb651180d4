//! Result table configuration.

use super::lock::{DEFAULT_LOCK_ATTEMPTS, DEFAULT_LOCK_DELAY};
use crate::errors::ConfigError;
use crate::utils::expand_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// One header cell: either `{"title": "..."}` or a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderCell {
    /// A titled header cell.
    Titled {
        /// The header title.
        title: String,
    },
    /// A bare title.
    Plain(String),
}

impl HeaderCell {
    /// Returns the header title.
    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Self::Titled { title } | Self::Plain(title) => title,
        }
    }
}

/// Configuration of a [`ResultTable`](super::ResultTable).
///
/// Unknown keys are ignored so board descriptions carrying extra metadata
/// (`board_type`, `board_name`) deserialize as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Backing file location; a leading `~` is expanded.
    pub file_path: String,
    /// Number of data rows, not counting header rows.
    pub row_count: usize,
    /// Number of columns.
    pub col_count: usize,
    /// Header rows, each a list of header cells.
    #[serde(default)]
    pub col_headers: Vec<Vec<HeaderCell>>,
    /// Merge with the on-disk table on flush.
    #[serde(default)]
    pub multi_access: bool,
    /// Keep the lock for the write phase of a merge-on-write flush.
    #[serde(default)]
    pub hold_lock_during_write: bool,
    /// Lock acquisition attempts.
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,
    /// Delay between lock acquisition attempts, in milliseconds.
    #[serde(default = "default_lock_delay_ms")]
    pub lock_delay_ms: u64,
}

fn default_lock_attempts() -> u32 {
    DEFAULT_LOCK_ATTEMPTS
}

fn default_lock_delay_ms() -> u64 {
    u64::try_from(DEFAULT_LOCK_DELAY.as_millis()).unwrap_or(1)
}

impl TableConfig {
    /// Creates a single-writer configuration without headers.
    #[must_use]
    pub fn new(file_path: impl Into<String>, row_count: usize, col_count: usize) -> Self {
        Self {
            file_path: file_path.into(),
            row_count,
            col_count,
            col_headers: Vec::new(),
            multi_access: false,
            hold_lock_during_write: false,
            lock_attempts: DEFAULT_LOCK_ATTEMPTS,
            lock_delay_ms: default_lock_delay_ms(),
        }
    }

    /// Reads and validates a configuration value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, ConfigError> {
        let config = Self::deserialize(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Adds a header row of titles.
    #[must_use]
    pub fn with_header_row<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.col_headers
            .push(titles.into_iter().map(|t| HeaderCell::Plain(t.into())).collect());
        self
    }

    /// Enables or disables merge-on-write.
    #[must_use]
    pub const fn with_multi_access(mut self, enabled: bool) -> Self {
        self.multi_access = enabled;
        self
    }

    /// Enables or disables holding the lock across the write phase.
    #[must_use]
    pub const fn with_hold_lock_during_write(mut self, enabled: bool) -> Self {
        self.hold_lock_during_write = enabled;
        self
    }

    /// Sets the lock retry budget.
    #[must_use]
    pub const fn with_lock_retry(mut self, attempts: u32, delay_ms: u64) -> Self {
        self.lock_attempts = attempts;
        self.lock_delay_ms = delay_ms;
        self
    }

    /// Checks the required values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.file_path.trim().is_empty() {
            return Err(ConfigError::EmptyPath);
        }
        if self.row_count == 0 {
            return Err(ConfigError::NonPositive { key: "row_count" });
        }
        if self.col_count == 0 {
            return Err(ConfigError::NonPositive { key: "col_count" });
        }
        Ok(())
    }

    /// Returns the number of header rows.
    #[must_use]
    pub fn header_rows(&self) -> usize {
        self.col_headers.len()
    }

    /// Returns the total number of rows, header rows included.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.row_count + self.header_rows()
    }

    /// Returns the backing file path with `~` expanded.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        expand_path(&self.file_path)
    }

    /// Returns the delay between lock attempts.
    #[must_use]
    pub const fn lock_delay(&self) -> Duration {
        Duration::from_millis(self.lock_delay_ms)
    }
}
