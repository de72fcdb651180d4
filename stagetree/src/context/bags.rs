//! Parameter and environment bags carried by each task node.

use crate::errors::StageFailure;
use crate::utils::is_truthy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Reserved parameter key that prunes a node's subtree from traversal.
pub const SKIP_CONFIGURATION: &str = "skip_configuration";

/// Reserved environment key holding the run counter used in failure records.
pub const RUN_COUNT: &str = "RUN_COUNT";

/// Immutable stage configuration supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterBag {
    values: Map<String, Value>,
}

impl ParameterBag {
    /// Creates an empty parameter bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a parameter value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Gets a parameter value, failing with a missing-argument failure if absent.
    pub fn require(&self, key: &str) -> Result<&Value, StageFailure> {
        self.values
            .get(key)
            .ok_or_else(|| StageFailure::missing_argument(key))
    }

    /// Gets a string parameter.
    pub fn require_str(&self, key: &str) -> Result<&str, StageFailure> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| StageFailure::other(format!("Parameter '{key}' must be a string")))
    }

    /// Returns true if the parameter is present and truthy.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(is_truthy)
    }

    /// Returns true if the stage asks to be skipped with its whole subtree.
    #[must_use]
    pub fn skips_configuration(&self) -> bool {
        self.flag(SKIP_CONFIGURATION)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for ParameterBag {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl fmt::Display for ParameterBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(f, &self.values)
    }
}

/// Mutable run-time context of a stage, such as iteration counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentBag {
    values: Map<String, Value>,
}

impl EnvironmentBag {
    /// Creates an empty environment bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets an environment value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Gets an environment value, failing with a missing-argument failure if absent.
    pub fn require(&self, key: &str) -> Result<&Value, StageFailure> {
        self.values
            .get(key)
            .ok_or_else(|| StageFailure::missing_argument(key))
    }

    /// Sets a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Removes a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Returns the `RUN_COUNT` entry, or 0 when absent or not an integer.
    #[must_use]
    pub fn run_count(&self) -> i64 {
        self.values
            .get(RUN_COUNT)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the bag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the underlying map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl From<Map<String, Value>> for EnvironmentBag {
    fn from(values: Map<String, Value>) -> Self {
        Self { values }
    }
}

impl fmt::Display for EnvironmentBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_json(f, &self.values)
    }
}

fn write_json(f: &mut fmt::Formatter<'_>, values: &Map<String, Value>) -> fmt::Result {
    let text = serde_json::to_string(values).map_err(|_| fmt::Error)?;
    f.write_str(&text)
}
