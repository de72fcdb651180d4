//! Tree fixtures for traversal tests and benchmarks.

use crate::context::EnvironmentBag;
use crate::errors::TreeError;
use crate::pipeline::{NodeId, TaskTree};
use serde_json::{Map, Value};

/// Builds nodes from a JSON description and returns the ids of the new roots.
///
/// The description is an array of node objects with a `name`, optional
/// `params` and `env` objects, and optional `children` arrays:
///
/// ```json
/// [{"name": "parser", "params": {"corpus": "en"}, "children": [{"name": "learner"}]}]
/// ```
pub fn build_tree(tree: &mut TaskTree, description: &Value) -> Result<Vec<NodeId>, TreeError> {
    let mut roots = Vec::new();
    for node in description.as_array().into_iter().flatten() {
        roots.push(add_described(tree, node, 0, None)?);
    }
    Ok(roots)
}

fn add_described(
    tree: &mut TaskTree,
    node: &Value,
    level: u32,
    parent: Option<NodeId>,
) -> Result<NodeId, TreeError> {
    let name = node.get("name").and_then(Value::as_str).unwrap_or_default();
    let params = object_or_empty(node.get("params"));
    let env = node
        .get("env")
        .map(|env| EnvironmentBag::from(object_or_empty(Some(env))));

    let id = tree.add_node(level, name, params, env, parent)?;
    for child in node.get("children").and_then(Value::as_array).into_iter().flatten() {
        add_described(tree, child, level + 1, Some(id))?;
    }
    Ok(id)
}

fn object_or_empty(value: Option<&Value>) -> Map<String, Value> {
    value.and_then(Value::as_object).cloned().unwrap_or_default()
}

/// Builds `roots` complete trees of the given `width` and `depth` and
/// returns the total number of nodes created.
pub fn wide_tree(tree: &mut TaskTree, roots: usize, width: usize, depth: u32) -> usize {
    let mut created = 0;
    for r in 0..roots {
        let root = tree.add_root(format!("path-{r}"), Map::new());
        created += 1;
        let mut frontier = vec![root];
        for _ in 0..depth {
            let mut next = Vec::with_capacity(frontier.len() * width);
            for parent in frontier {
                for w in 0..width {
                    if let Ok(child) = tree.add_child(parent, format!("stage-{w}"), Map::new()) {
                        next.push(child);
                        created += 1;
                    }
                }
            }
            frontier = next;
        }
    }
    created
}
