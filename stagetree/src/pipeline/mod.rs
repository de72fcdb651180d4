//! Pipeline trees and their execution.
//!
//! This module provides:
//! - Task nodes held in an arena with a root registry
//! - The fault-isolated tree executor
//! - Failure records and traversal reports

mod executor;
mod node;
mod report;

pub use executor::{stage_fn, ExecutorConfig, PermissionLogging, StageHandler, TreeExecutor};
#[cfg(test)]
pub use executor::MockStageHandler;
pub use node::{NodeId, TaskNode, TaskTree};
pub use report::{FailureRecord, TraversalReport};
