use std::collections::HashSet;

use crate::core::manifest::NodeId;
use crate::graph::DependencyGraph;

/// Bottom-up load order: post-order DFS from `root`, children in stored
/// order, every reachable node exactly once. Nodes reached again through a
/// cycle are skipped; unreachable nodes are never emitted.
pub fn load_order(graph: &DependencyGraph, root: &NodeId) -> Vec<NodeId> {
    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut order = Vec::new();
    let mut stack: Vec<(&NodeId, usize)> = vec![(root, 0)];
    visited.insert(root);

    while let Some(top) = stack.last_mut() {
        let node = top.0;
        if let Some(child) = graph.dependencies_of(node).get(top.1) {
            top.1 += 1;
            if visited.insert(child) {
                stack.push((child, 0));
            }
            continue;
        }
        order.push(node.clone());
        stack.pop();
    }

    order
}
