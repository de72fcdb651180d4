//! Testing utilities for stage trees.
//!
//! This module provides:
//! - Recording and failing stage handlers
//! - Tree fixtures built from JSON descriptions
//! - Assertions over visit order and traversal reports
//! - A log capture subscriber for checking failure records

mod assertions;
mod fixtures;
mod logs;
mod mocks;

pub use assertions::{assert_failed_stages, assert_not_visited, assert_visit_order};
pub use fixtures::{build_tree, wide_tree};
pub use logs::CapturedLogs;
pub use mocks::{FailingHandler, RecordingHandler};
