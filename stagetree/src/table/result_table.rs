//! File-backed result matrix with merge-on-write.

use super::config::TableConfig;
use super::lock::ScopedLock;
use super::{Axis, UNSET_MARKER};
use crate::errors::{LockError, TableError};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error};

/// A rows × columns matrix of optional cell values persisted as text.
///
/// Several independent runs can share one backing file when
/// `multi_access` is enabled: on flush, cells this instance never set are
/// filled from the file before the table is written back, so each run
/// contributes its own cells without erasing the others'.
///
/// The final write happens outside the lock unless
/// `hold_lock_during_write` is set. Two writers that both finish merging
/// before either writes can therefore lose the earlier writer's fresh
/// merge; the stricter mode closes that window at the price of holding the
/// sentinel for the whole flush.
#[derive(Debug, Clone)]
pub struct ResultTable {
    path: PathBuf,
    columns: usize,
    cells: Vec<Vec<Option<String>>>,
    row_names: Option<HashMap<String, usize>>,
    col_names: Option<HashMap<String, usize>>,
    multi_access: bool,
    hold_lock_during_write: bool,
    lock_delay: Duration,
    lock_attempts: u32,
}

impl ResultTable {
    /// Allocates a table from a validated configuration.
    ///
    /// Header rows come first and receive up to `col_count` titles each;
    /// shorter header rows leave trailing cells unset.
    pub fn from_config(config: &TableConfig) -> Result<Self, TableError> {
        config.validate()?;

        let rows = config.total_rows();
        let columns = config.col_count;
        let mut cells = vec![vec![None; columns]; rows];

        for (row, titles) in config.col_headers.iter().enumerate() {
            for (col, header) in titles.iter().take(columns).enumerate() {
                cells[row][col] = Some(checked_cell(row, col, header.title().to_string())?);
            }
        }

        Ok(Self {
            path: config.path(),
            columns,
            cells,
            row_names: None,
            col_names: None,
            multi_access: config.multi_access,
            hold_lock_during_write: config.hold_lock_during_write,
            lock_delay: config.lock_delay(),
            lock_attempts: config.lock_attempts,
        })
    }

    /// Allocates a table from a JSON configuration value.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, TableError> {
        let config = TableConfig::from_value(value)?;
        Self::from_config(&config)
    }

    /// Returns the number of rows, header rows included.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// Returns the number of columns.
    #[must_use]
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if flushes merge with the backing file.
    #[must_use]
    pub const fn is_multi_access(&self) -> bool {
        self.multi_access
    }

    /// Returns a cell value, or `None` if it is unset or out of range.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.cells.get(row)?.get(col)?.as_deref()
    }

    /// Sets a cell by index.
    ///
    /// Values must be non-empty and contain no whitespace, so that every
    /// written row reads back with the configured number of cells.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl ToString) -> Result<(), TableError> {
        let (rows, cols) = (self.rows(), self.columns);
        let cell = self
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(TableError::IndexOutOfRange { row, col, rows, cols })?;
        *cell = Some(checked_cell(row, col, value.to_string())?);
        Ok(())
    }

    /// Sets a cell by row and column name.
    pub fn set_cell_by_names(
        &mut self,
        row_name: &str,
        col_name: &str,
        value: impl ToString,
    ) -> Result<(), TableError> {
        let row = self.row_index(row_name)?;
        let col = self.col_index(col_name)?;
        self.set_cell(row, col, value)
    }

    /// Names every row, in positional order.
    pub fn set_row_names<I, S>(&mut self, names: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.row_names = Some(index_names(Axis::Row, names, self.rows())?);
        Ok(())
    }

    /// Names every column, in positional order.
    pub fn set_col_names<I, S>(&mut self, names: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.col_names = Some(index_names(Axis::Column, names, self.columns)?);
        Ok(())
    }

    /// Resolves a row name.
    pub fn row_index(&self, name: &str) -> Result<usize, TableError> {
        lookup(Axis::Row, self.row_names.as_ref(), name)
    }

    /// Resolves a column name.
    pub fn col_index(&self, name: &str) -> Result<usize, TableError> {
        lookup(Axis::Column, self.col_names.as_ref(), name)
    }

    /// Persists the table to its backing file.
    ///
    /// With `multi_access`, cells still unset in memory are first filled
    /// from the existing file under the advisory lock.
    ///
    /// # Errors
    ///
    /// Lock failures and row or cell count mismatches abort the flush
    /// before anything is written.
    pub fn flush(&mut self) -> Result<(), TableError> {
        self.flush_inner().inspect_err(|err| {
            if let TableError::Io(io_err) = err {
                error!(path = %self.path.display(), "IOError: {io_err}");
            }
        })
    }

    fn flush_inner(&mut self) -> Result<(), TableError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !self.multi_access {
            return self.write();
        }

        if self.hold_lock_during_write {
            let lock = self.lock()?;
            self.merge_existing()?;
            self.write()?;
            lock.release()?;
            return Ok(());
        }

        if self.path.is_file() {
            let lock = self.lock()?;
            self.merge_existing()?;
            lock.release()?;
        }
        self.write()
    }

    fn lock(&self) -> Result<ScopedLock, LockError> {
        ScopedLock::acquire(&self.path, self.lock_delay, self.lock_attempts)
    }

    /// Fills unset cells from the backing file, if it exists.
    ///
    /// Every row is validated before any cell is adopted, so a mismatch
    /// leaves the in-memory table untouched.
    fn merge_existing(&mut self) -> Result<(), TableError> {
        if !self.path.is_file() {
            return Ok(());
        }

        let text = fs::read_to_string(&self.path)?;
        let disk = parse_rows(&text);

        if disk.len() != self.rows() {
            return Err(TableError::RowCountMismatch {
                path: self.path.clone(),
                found: disk.len(),
                expected: self.rows(),
            });
        }

        if let Some((row, cells)) = disk
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != self.columns)
        {
            return Err(TableError::CellCountMismatch {
                row,
                found: cells.len(),
                expected: self.columns,
            });
        }

        let mut adopted = 0usize;
        for (row, disk_row) in self.cells.iter_mut().zip(disk) {
            for (cell, disk_cell) in row.iter_mut().zip(disk_row) {
                if cell.is_none() && disk_cell != UNSET_MARKER {
                    *cell = Some(disk_cell);
                    adopted += 1;
                }
            }
        }

        debug!(path = %self.path.display(), adopted, "Merged result table with backing file");
        Ok(())
    }

    fn write(&self) -> Result<(), TableError> {
        fs::write(&self.path, self.to_string())?;
        debug!(path = %self.path.display(), rows = self.rows(), "Result table written");
        Ok(())
    }
}

impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            let line: Vec<&str> = row
                .iter()
                .map(|cell| cell.as_deref().unwrap_or(UNSET_MARKER))
                .collect();
            writeln!(f, "{}", line.join("\t"))?;
        }
        Ok(())
    }
}

/// Parses serialized table text into rows of whitespace-separated cells.
///
/// Trailing blank lines are dropped.
#[must_use]
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    lines
        .into_iter()
        .map(|line| line.split_whitespace().map(str::to_string).collect())
        .collect()
}

fn checked_cell(row: usize, col: usize, value: String) -> Result<String, TableError> {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(TableError::UnparsableCell { row, col, value });
    }
    Ok(value)
}

fn index_names<I, S>(axis: Axis, names: I, expected: usize) -> Result<HashMap<String, usize>, TableError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let names: Vec<String> = names.into_iter().map(Into::into).collect();
    if names.len() != expected {
        return Err(TableError::NameCountMismatch {
            axis,
            expected,
            actual: names.len(),
        });
    }

    let mut index = HashMap::with_capacity(names.len());
    for (position, name) in names.into_iter().enumerate() {
        if index.contains_key(&name) {
            return Err(TableError::DuplicateName { axis, name });
        }
        index.insert(name, position);
    }
    Ok(index)
}

fn lookup(axis: Axis, names: Option<&HashMap<String, usize>>, name: &str) -> Result<usize, TableError> {
    let names = names.ok_or(TableError::NamesNotAssigned { axis })?;
    names.get(name).copied().ok_or_else(|| TableError::UnknownName {
        axis,
        name: name.to_string(),
    })
}
