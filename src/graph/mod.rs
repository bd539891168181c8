use std::collections::HashMap;

use crate::core::manifest::NodeId;

pub mod builder;
pub mod ops;
pub mod viz;

/// Adjacency lists keyed by node. Lists keep declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    pub edges: HashMap<NodeId, Vec<NodeId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dependencies_of(&self, node: &NodeId) -> &[NodeId] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.edges.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.edges.keys()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for DependencyGraph
where
    K: Into<NodeId>,
    V: IntoIterator,
    V::Item: Into<NodeId>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let edges = iter
            .into_iter()
            .map(|(node, deps)| (node.into(), deps.into_iter().map(Into::into).collect()))
            .collect();
        Self { edges }
    }
}
