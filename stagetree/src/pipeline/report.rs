//! Failure records and traversal summaries.
//!
//! A failed stage never stops its siblings or other execution paths; the
//! executor records it here and moves on, so the caller can inspect what
//! was lost after the run.

use super::TaskNode;
use crate::errors::{FailureKind, StageFailure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of a stage failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Stage name.
    pub stage: String,
    /// 1-based hierarchy level, as shown in failure logs.
    pub cfg: u64,
    /// Run counter taken from the stage environment.
    pub run: i64,
    /// Failure category.
    pub kind: FailureKind,
    /// Failure message.
    pub message: String,
    /// When the failure was recorded.
    pub timestamp: DateTime<Utc>,
}

impl FailureRecord {
    /// Creates a record for a failure raised at `node`.
    #[must_use]
    pub fn new(node: &TaskNode, failure: &StageFailure) -> Self {
        Self {
            stage: node.name().to_string(),
            cfg: node.cfg(),
            run: node.environment().run_count(),
            kind: failure.kind(),
            message: failure.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Summary of one traversal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraversalReport {
    /// Number of execution paths started.
    pub paths: usize,
    /// Nodes reached (not skipped).
    pub visited: usize,
    /// Nodes whose handler completed.
    pub succeeded: usize,
    /// Nodes pruned by `skip_configuration`, counted once per pruned subtree.
    pub skipped: usize,
    /// Contained failures in the order they occurred.
    pub failures: Vec<FailureRecord>,
}

impl TraversalReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if any failures occurred.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Returns the names of failed stages in failure order.
    #[must_use]
    pub fn failed_stages(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.stage.as_str()).collect()
    }

    /// Returns the failures of one category.
    pub fn failures_of(&self, kind: FailureKind) -> impl Iterator<Item = &FailureRecord> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    /// Returns the share of visited nodes that succeeded.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        if self.visited == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.visited as f64
    }

    /// Converts to a JSON value.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "paths": self.paths,
            "visited": self.visited,
            "succeeded": self.succeeded,
            "skipped": self.skipped,
            "success_rate": self.success_rate(),
            "failures": self.failures.iter().map(|f| {
                serde_json::json!({
                    "stage": f.stage,
                    "cfg": f.cfg,
                    "run": f.run,
                    "kind": f.kind.as_str(),
                    "message": f.message,
                    "timestamp": f.timestamp.to_rfc3339(),
                })
            }).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EnvironmentBag, RUN_COUNT};
    use crate::pipeline::TaskTree;
    use serde_json::{json, Map};

    #[test]
    fn test_failure_record_from_node() {
        let mut env = EnvironmentBag::new();
        env.insert(RUN_COUNT, json!(3));

        let mut tree = TaskTree::new();
        let root = tree.add_root("parser", Map::new());
        let child = tree
            .add_node(1, "evaluator", Map::new(), Some(env), Some(root))
            .unwrap();

        let failure = StageFailure::missing_resource("ref.ull not found");
        let record = FailureRecord::new(tree.get(child).unwrap(), &failure);

        assert_eq!(record.stage, "evaluator");
        assert_eq!(record.cfg, 2);
        assert_eq!(record.run, 3);
        assert_eq!(record.kind, FailureKind::MissingResource);
        assert_eq!(record.message, "ref.ull not found");
    }

    #[test]
    fn test_report_summary() {
        let mut tree = TaskTree::new();
        let root = tree.add_root("a", Map::new());
        let node = tree.get(root).unwrap();

        let mut report = TraversalReport::new();
        report.visited = 4;
        report.succeeded = 3;
        report
            .failures
            .push(FailureRecord::new(node, &StageFailure::other("boom")));

        assert!(report.has_failures());
        assert_eq!(report.failed_stages(), vec!["a"]);
        assert_eq!(report.failures_of(FailureKind::Other).count(), 1);
        assert_eq!(report.failures_of(FailureKind::MissingArgument).count(), 0);
        assert!((report.success_rate() - 0.75).abs() < f64::EPSILON);

        let json = report.to_json();
        assert_eq!(json["failures"][0]["kind"], "Other");
        assert_eq!(json["visited"], 4);
    }

    #[test]
    fn test_empty_report() {
        let report = TraversalReport::new();
        assert!(!report.has_failures());
        assert!(report.success_rate().abs() < f64::EPSILON);
    }
}
