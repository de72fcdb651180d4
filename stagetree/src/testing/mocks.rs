//! Mock stage handlers for testing.

use crate::context::ComponentRegistry;
use crate::errors::{FailureKind, StageFailure};
use crate::pipeline::{StageHandler, TaskNode};
use std::collections::HashMap;

/// A handler that records the name of every stage it runs and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    visited: Vec<String>,
}

impl RecordingHandler {
    /// Creates a new recording handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the visited stage names in visit order.
    #[must_use]
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Returns how many times `stage` was visited.
    #[must_use]
    pub fn visit_count(&self, stage: &str) -> usize {
        self.visited.iter().filter(|name| *name == stage).count()
    }

    /// Clears recorded visits.
    pub fn clear(&mut self) {
        self.visited.clear();
    }
}

impl StageHandler for RecordingHandler {
    fn handle(&mut self, node: &mut TaskNode, _components: &ComponentRegistry) -> Result<(), StageFailure> {
        self.visited.push(node.name().to_string());
        Ok(())
    }
}

/// A handler that records visits and fails on selected stages.
#[derive(Debug, Default)]
pub struct FailingHandler {
    failures: HashMap<String, FailureKind>,
    visited: Vec<String>,
}

impl FailingHandler {
    /// Creates a handler that fails nowhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the handler fail with `kind` whenever it runs `stage`.
    #[must_use]
    pub fn fail_on(mut self, stage: impl Into<String>, kind: FailureKind) -> Self {
        self.failures.insert(stage.into(), kind);
        self
    }

    /// Returns the visited stage names in visit order, failed ones included.
    #[must_use]
    pub fn visited(&self) -> &[String] {
        &self.visited
    }
}

impl StageHandler for FailingHandler {
    fn handle(&mut self, node: &mut TaskNode, _components: &ComponentRegistry) -> Result<(), StageFailure> {
        self.visited.push(node.name().to_string());
        match self.failures.get(node.name()) {
            Some(kind) => Err(StageFailure::new(*kind, format!("{} failed", node.name()))),
            None => Ok(()),
        }
    }
}
