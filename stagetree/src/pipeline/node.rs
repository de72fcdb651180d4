//! Task nodes and the arena that owns them.

use crate::context::{EnvironmentBag, ParameterBag};
use crate::errors::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a node within its [`TaskTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the arena index of the node.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One stage of an experiment pipeline.
#[derive(Debug, Clone)]
pub struct TaskNode {
    id: NodeId,
    level: u32,
    name: String,
    parameters: ParameterBag,
    environment: EnvironmentBag,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl TaskNode {
    /// Returns the node id.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the hierarchy level (0 for top-level stages).
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Returns the 1-based level shown in failure records.
    #[must_use]
    pub fn cfg(&self) -> u64 {
        u64::from(self.level) + 1
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage parameters.
    #[must_use]
    pub const fn parameters(&self) -> &ParameterBag {
        &self.parameters
    }

    /// Returns the run-time environment.
    #[must_use]
    pub const fn environment(&self) -> &EnvironmentBag {
        &self.environment
    }

    /// Returns the run-time environment for modification.
    pub fn environment_mut(&mut self) -> &mut EnvironmentBag {
        &mut self.environment
    }

    /// Returns the children in declaration order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns the parent, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns true if the node has no parent.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Arena of task nodes with a registry of roots in registration order.
///
/// Every node created without a parent becomes a root, i.e. the start of an
/// independent execution path.
#[derive(Debug, Clone, Default)]
pub struct TaskTree {
    nodes: Vec<TaskNode>,
    roots: Vec<NodeId>,
}

impl TaskTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node.
    ///
    /// Without a parent the node is registered as a new root; otherwise it
    /// is appended to the parent's children. Level and name are not
    /// validated.
    pub fn add_node(
        &mut self,
        level: u32,
        name: impl Into<String>,
        parameters: impl Into<ParameterBag>,
        environment: Option<EnvironmentBag>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        if let Some(parent) = parent {
            if parent.0 >= self.nodes.len() {
                return Err(TreeError::UnknownParent { parent: parent.0 });
            }
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(TaskNode {
            id,
            level,
            name: name.into(),
            parameters: parameters.into(),
            environment: environment.unwrap_or_default(),
            children: Vec::new(),
            parent,
        });

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        Ok(id)
    }

    /// Adds a top-level stage at level 0.
    pub fn add_root(&mut self, name: impl Into<String>, parameters: impl Into<ParameterBag>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TaskNode {
            id,
            level: 0,
            name: name.into(),
            parameters: parameters.into(),
            environment: EnvironmentBag::default(),
            children: Vec::new(),
            parent: None,
        });
        self.roots.push(id);
        id
    }

    /// Adds a child stage one level below its parent.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        parameters: impl Into<ParameterBag>,
    ) -> Result<NodeId, TreeError> {
        let parent_level = self
            .get(parent)
            .map(TaskNode::level)
            .ok_or(TreeError::UnknownParent { parent: parent.0 })?;
        let level = parent_level.checked_add(1).ok_or(TreeError::LevelOverflow {
            parent: parent.0,
            level: parent_level,
        })?;
        self.add_node(level, name, parameters, None, Some(parent))
    }

    /// Returns a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&TaskNode> {
        self.nodes.get(id.0)
    }

    /// Returns a node for modification.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TaskNode> {
        self.nodes.get_mut(id.0)
    }

    /// Returns the roots in registration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the ids of `id` and all of its descendants in pre-order.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.get(current) else {
                continue;
            };
            order.push(current);
            stack.extend(node.children.iter().rev());
        }
        order
    }

    /// Removes every node and root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_parentless_nodes_become_roots() {
        let mut tree = TaskTree::new();
        let a = tree.add_node(0, "text-parser", Map::new(), None, None).unwrap();
        let b = tree.add_node(0, "grammar-learner", Map::new(), None, None).unwrap();

        assert_eq!(tree.roots(), &[a, b]);
        assert!(tree.get(a).unwrap().is_root());
    }

    #[test]
    fn test_children_keep_declaration_order() {
        let mut tree = TaskTree::new();
        let root = tree.add_root("parser", Map::new());
        let first = tree.add_child(root, "learner-1", Map::new()).unwrap();
        let second = tree.add_child(root, "learner-2", Map::new()).unwrap();

        let node = tree.get(root).unwrap();
        assert_eq!(node.children(), &[first, second]);
        assert_eq!(tree.get(first).unwrap().parent(), Some(root));
        assert_eq!(tree.get(second).unwrap().level(), 1);
        assert_eq!(tree.roots(), &[root]);
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut tree = TaskTree::new();
        let err = tree
            .add_node(1, "orphan", Map::new(), None, Some(NodeId(7)))
            .unwrap_err();
        assert!(matches!(err, TreeError::UnknownParent { parent: 7 }));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_environment_defaults_to_empty() {
        let mut tree = TaskTree::new();
        let id = tree
            .add_node(0, "stage", params(json!({"corpus": "poc-english"})), None, None)
            .unwrap();
        let node = tree.get(id).unwrap();
        assert!(node.environment().is_empty());
        assert_eq!(node.parameters().get("corpus"), Some(&json!("poc-english")));
    }

    #[test]
    fn test_subtree_is_pre_order() {
        let mut tree = TaskTree::new();
        let root = tree.add_root("a", Map::new());
        let b = tree.add_child(root, "b", Map::new()).unwrap();
        let c = tree.add_child(b, "c", Map::new()).unwrap();
        let d = tree.add_child(root, "d", Map::new()).unwrap();

        assert_eq!(tree.subtree(root), vec![root, b, c, d]);
        assert_eq!(tree.subtree(b), vec![b, c]);
    }

    #[test]
    fn test_clear() {
        let mut tree = TaskTree::new();
        let root = tree.add_root("a", Map::new());
        tree.add_child(root, "b", Map::new()).unwrap();
        tree.clear();

        assert!(tree.is_empty());
        assert!(tree.roots().is_empty());
    }
}
