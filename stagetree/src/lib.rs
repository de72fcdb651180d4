//! # Stagetree
//!
//! Fault-isolated execution of pipeline trees, with a shared result table
//! that independent runs fill in together.
//!
//! Stagetree provides:
//!
//! - **Tree execution**: every root is an execution path walked depth-first,
//!   and a failing stage loses only its own subtree
//! - **Failure classification**: missing arguments, missing resources and
//!   permission problems are logged and recorded separately from interrupts,
//!   which abort the whole run
//! - **Shared components**: a caller-owned registry of named instances that
//!   stage handlers look up during traversal
//! - **Result tables**: a text matrix with merge-on-write under an advisory
//!   sentinel-file lock, for runs that share one summary file
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagetree::prelude::*;
//! use serde_json::json;
//!
//! let mut ctx = ExperimentContext::new();
//! ctx.components().insert("stat", TableComponent::new(&json!({
//!     "file_path": "~/dash-board/summary.txt",
//!     "row_count": 2,
//!     "col_count": 3,
//!     "multi_access": true,
//! }))?);
//!
//! ctx.tree_mut().add_root("parser", json!({"row": 1, "col": 0, "val": "en"}).as_object().cloned().unwrap_or_default());
//!
//! let mut handler = stage_fn(|node, components| {
//!     let stat = components.get::<TableComponent>("stat").ok_or_else(|| StageFailure::missing_resource("stat"))?;
//!     let result = stat.lock().set_from_parameters(node.parameters().as_map());
//!     result
//! });
//!
//! let report = TreeExecutor::new().traverse_all(&mut ctx, &mut handler)?;
//! ctx.reset_static_components();
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod context;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod table;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::context::{ComponentRegistry, EnvironmentBag, ExperimentContext, ParameterBag};
    pub use crate::errors::{
        FailureKind, LockError, StageFailure, TableError, TraversalError, TreeError,
    };
    pub use crate::observability::init_tracing;
    pub use crate::pipeline::{
        stage_fn, ExecutorConfig, NodeId, PermissionLogging, StageHandler, TaskNode, TaskTree,
        TraversalReport, TreeExecutor,
    };
    pub use crate::table::{ResultTable, ScopedLock, TableComponent, TableConfig};
}
