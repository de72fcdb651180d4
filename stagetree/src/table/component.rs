//! Dashboard stage component wrapping a [`ResultTable`].

use super::ResultTable;
use crate::errors::{StageFailure, TableError};
use crate::utils::value_to_text;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

static INDEX_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-+]?\s*\d+|[-+]\s*\d+").expect("index term pattern is valid")
});

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder pattern is valid"));

/// A result table used as a shared pipeline component.
///
/// Stages address cells with integer indexes or additive expressions such
/// as `"1+ 3"`, and may template values with `{key}` placeholders filled
/// from their arguments. Unsaved changes are flushed when the component is
/// dropped, so releasing the component registry persists the table at
/// least once.
#[derive(Debug)]
pub struct TableComponent {
    table: ResultTable,
    dirty: bool,
}

impl TableComponent {
    /// Creates the component from a table configuration value.
    pub fn new(config: &Value) -> Result<Self, TableError> {
        Ok(Self::from_table(ResultTable::from_value(config)?))
    }

    /// Wraps an existing table.
    #[must_use]
    pub const fn from_table(table: ResultTable) -> Self {
        Self { table, dirty: false }
    }

    /// Returns the table.
    #[must_use]
    pub const fn table(&self) -> &ResultTable {
        &self.table
    }

    /// Returns the table for modification; the component is then considered unsaved.
    pub fn table_mut(&mut self) -> &mut ResultTable {
        self.dirty = true;
        &mut self.table
    }

    /// Returns true if there are changes not yet flushed.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sets one cell.
    ///
    /// `row` and `col` are integers or additive expressions; `value` is
    /// rendered as text with `{key}` placeholders replaced from `args`.
    pub fn set(&mut self, row: &Value, col: &Value, value: &Value, args: &Map<String, Value>) -> Result<(), TableError> {
        let row = parse_index(row)?;
        let col = parse_index(col)?;
        let text = format_value(&value_to_text(value), args);

        debug!(row, col, value = %text, "Setting result table cell");
        self.table.set_cell(row, col, text)?;
        self.dirty = true;
        Ok(())
    }

    /// Sets one cell from stage parameters `row`, `col` and `val`; all
    /// parameters are available as placeholders.
    pub fn set_from_parameters(&mut self, params: &Map<String, Value>) -> Result<(), StageFailure> {
        let required = |key: &str| params.get(key).ok_or_else(|| StageFailure::missing_argument(key));
        let row = required("row")?;
        let col = required("col")?;
        let value = required("val")?;

        self.set(row, col, value, params)?;
        Ok(())
    }

    /// Persists the table.
    pub fn flush(&mut self) -> Result<(), TableError> {
        self.table.flush()?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for TableComponent {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(err) = self.table.flush() {
                warn!(path = %self.table.path().display(), "Failed to flush result table on release: {err}");
            }
        }
    }
}

/// Converts an integer or an additive expression such as `"1+ 3"` to an index.
pub fn parse_index(value: &Value) -> Result<usize, TableError> {
    let invalid = || TableError::InvalidIndexExpression(value_to_text(value));

    if let Some(n) = value.as_u64() {
        return usize::try_from(n).map_err(|_| invalid());
    }

    let expr = value.as_str().ok_or_else(invalid)?;
    let mut terms = INDEX_TERM.find_iter(expr).peekable();
    if terms.peek().is_none() {
        return Err(invalid());
    }

    let mut sum: i64 = 0;
    for term in terms {
        let compact: String = term.as_str().chars().filter(|c| !c.is_whitespace()).collect();
        let n: i64 = compact.parse().map_err(|_| invalid())?;
        sum = sum.checked_add(n).ok_or_else(invalid)?;
    }

    usize::try_from(sum).map_err(|_| invalid())
}

/// Replaces `{key}` placeholders with values from `args`; unknown keys are left intact.
#[must_use]
pub fn format_value(template: &str, args: &Map<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match args.get(&caps[1]) {
            Some(value) => value_to_text(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}
