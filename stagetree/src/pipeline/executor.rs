//! Fault-isolated depth-first traversal of task trees.
//!
//! Each root of the tree is an independent execution path. Within a path,
//! stages are visited in pre-order. A stage whose handler fails loses its
//! own subtree but nothing else: siblings and other paths still run. Only
//! an interrupt, raised by a handler or through the context's cancellation
//! token, aborts the traversal as a whole.

use super::{FailureRecord, NodeId, TaskNode, TaskTree, TraversalReport};
use crate::cancellation::CancellationToken;
use crate::context::{ComponentRegistry, ExperimentContext};
use crate::errors::{FailureKind, StageFailure, TraversalError};
use crate::observability::{stage_span, traversal_span, SpanTimer};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Work performed at each visited stage.
///
/// Closures taking `(&mut TaskNode, &ComponentRegistry)` implement this
/// trait; see [`stage_fn`] for a helper that pins down their signature.
#[cfg_attr(test, mockall::automock)]
pub trait StageHandler {
    /// Runs the stage.
    ///
    /// The handler may read the node's parameters, update its environment,
    /// and use shared components. A returned failure prunes the node's
    /// subtree unless it is an interrupt.
    fn handle(&mut self, node: &mut TaskNode, components: &ComponentRegistry) -> Result<(), StageFailure>;
}

impl<F> StageHandler for F
where
    F: FnMut(&mut TaskNode, &ComponentRegistry) -> Result<(), StageFailure>,
{
    fn handle(&mut self, node: &mut TaskNode, components: &ComponentRegistry) -> Result<(), StageFailure> {
        self(node, components)
    }
}

/// Wraps a closure as a [`StageHandler`], fixing its argument types.
pub fn stage_fn<F>(handler: F) -> F
where
    F: FnMut(&mut TaskNode, &ComponentRegistry) -> Result<(), StageFailure>,
{
    handler
}

/// How permission failures are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLogging {
    /// A bare error line with the failure message only, without the stage
    /// annotation or the verbose context logged for other categories.
    #[default]
    Reduced,
    /// The same record as every other category.
    Full,
}

/// Executor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Logging of permission failures.
    pub permission_logging: PermissionLogging,
}

/// Walks the execution paths of an [`ExperimentContext`].
#[derive(Debug, Clone, Default)]
pub struct TreeExecutor {
    config: ExecutorConfig,
}

impl TreeExecutor {
    /// Creates an executor with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor with the given configuration.
    #[must_use]
    pub const fn with_config(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Traverses every execution path in root registration order.
    ///
    /// # Errors
    ///
    /// Returns [`TraversalError::Interrupted`] if a handler raises an
    /// interrupt or the context is cancelled. No other handler failure
    /// reaches the caller; they are logged and listed in the report.
    pub fn traverse_all(
        &self,
        ctx: &mut ExperimentContext,
        handler: &mut dyn StageHandler,
    ) -> Result<TraversalReport, TraversalError> {
        let run_id = ctx.run_id();
        let (tree, components, cancellation) = ctx.split_mut();
        let roots = tree.roots().to_vec();

        let span = traversal_span(run_id, roots.len());
        let _entered = span.enter();

        let mut report = TraversalReport::new();
        let mut handler = Some(handler);

        for (i, root) in roots.into_iter().enumerate() {
            info!("Execution path: {i}");
            report.paths += 1;
            self.visit(tree, components, cancellation, &mut handler, root, &mut report)?;
        }

        info!(
            paths = report.paths,
            visited = report.visited,
            failed = report.failures.len(),
            skipped = report.skipped,
            "Traversal finished"
        );
        Ok(report)
    }

    /// Traverses the subtree rooted at `node`.
    ///
    /// A missing node (or one not in the tree) is a no-op. Without a
    /// handler the subtree is walked without doing any work, which still
    /// honours `skip_configuration` and cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`TraversalError::Interrupted`] on interrupt or cancellation.
    pub fn traverse(
        &self,
        ctx: &mut ExperimentContext,
        handler: Option<&mut dyn StageHandler>,
        node: Option<NodeId>,
    ) -> Result<TraversalReport, TraversalError> {
        let mut report = TraversalReport::new();
        let Some(node) = node else {
            return Ok(report);
        };

        let (tree, components, cancellation) = ctx.split_mut();
        let mut handler = handler;
        self.visit(tree, components, cancellation, &mut handler, node, &mut report)?;
        Ok(report)
    }

    fn visit(
        &self,
        tree: &mut TaskTree,
        components: &ComponentRegistry,
        cancellation: &CancellationToken,
        handler: &mut Option<&mut dyn StageHandler>,
        id: NodeId,
        report: &mut TraversalReport,
    ) -> Result<(), TraversalError> {
        let Some(node) = tree.get_mut(id) else {
            return Ok(());
        };

        if node.parameters().skips_configuration() {
            debug!(stage = %node.name(), "Skipping configuration subtree");
            report.skipped += 1;
            return Ok(());
        }

        if cancellation.is_cancelled() {
            return Err(TraversalError::Interrupted {
                stage: node.name().to_string(),
                reason: cancellation.reason().unwrap_or_default(),
            });
        }

        let span = stage_span(node);
        let _entered = span.enter();
        report.visited += 1;

        if let Some(active) = handler.as_mut() {
            let timer = SpanTimer::start(node.name());
            match active.handle(node, components) {
                Ok(()) => {
                    report.succeeded += 1;
                    debug!(duration_ms = timer.finish(), "Stage completed");
                }
                Err(failure) if !failure.kind().is_recoverable() => {
                    let reason = failure.to_string();
                    warn!(stage = %node.name(), reason = %reason, "Traversal interrupted");
                    return Err(TraversalError::Interrupted {
                        stage: node.name().to_string(),
                        reason,
                    });
                }
                Err(failure) => {
                    self.log_failure(node, &failure);
                    report.failures.push(FailureRecord::new(node, &failure));
                    return Ok(());
                }
            }
        }

        let children = node.children().to_vec();
        for child in children {
            self.visit(tree, components, cancellation, handler, child, report)?;
        }

        Ok(())
    }

    fn log_failure(&self, node: &TaskNode, failure: &StageFailure) {
        let kind = failure.kind();

        if kind == FailureKind::PermissionDenied
            && self.config.permission_logging == PermissionLogging::Reduced
        {
            error!("{failure}");
            return;
        }

        error!(
            kind = %kind,
            "{}(cfg={}, run={}):\n{}: {}\n",
            node.name(),
            node.cfg(),
            node.environment().run_count(),
            kind,
            failure
        );
        debug!(
            "{}\nEnvironment:\n{}\nParameters:\n{}",
            failure.detail(),
            node.environment(),
            node.parameters()
        );
    }
}
