//! The experiment context owned by the caller of a traversal.

use super::ComponentRegistry;
use crate::cancellation::CancellationToken;
use crate::pipeline::TaskTree;
use tracing::debug;
use uuid::Uuid;

/// Everything one pipeline run needs: the stage tree with its root
/// registry, the shared component registry, and the cancellation token.
///
/// The context is an explicit value passed by reference into the executor,
/// so independent runs in one process never share registries.
#[derive(Debug)]
pub struct ExperimentContext {
    run_id: Uuid,
    tree: TaskTree,
    components: ComponentRegistry,
    cancellation: CancellationToken,
}

impl ExperimentContext {
    /// Creates an empty context with a fresh run id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tree: TaskTree::new(),
            components: ComponentRegistry::new(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Uses an externally created cancellation token, e.g. one shared with a signal handler.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the run id.
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the stage tree.
    #[must_use]
    pub const fn tree(&self) -> &TaskTree {
        &self.tree
    }

    /// Returns the stage tree for construction.
    pub fn tree_mut(&mut self) -> &mut TaskTree {
        &mut self.tree
    }

    /// Returns the shared component registry.
    #[must_use]
    pub const fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Drops every shared component, releasing the resources they hold.
    pub fn reset_static_components(&self) {
        self.components.clear();
    }

    /// Clears the tree and the component registry and starts a new run id.
    pub fn reset(&mut self) {
        self.components.clear();
        self.tree.clear();
        self.cancellation.reset();
        self.run_id = Uuid::new_v4();
        debug!(run_id = %self.run_id, "Experiment context reset");
    }

    pub(crate) fn split_mut(&mut self) -> (&mut TaskTree, &ComponentRegistry, &CancellationToken) {
        (&mut self.tree, &self.components, &self.cancellation)
    }
}

impl Default for ExperimentContext {
    fn default() -> Self {
        Self::new()
    }
}
