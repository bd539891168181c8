use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::core::manifest::{Dependency, Manifest, NodeId};
use crate::error::{DepgraphError, Result};
use crate::graph::DependencyGraph;
use crate::source::traits::ManifestSource;

#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: DependencyGraph,
    /// Node the root request resolved to (`name@version` for registries).
    pub root: NodeId,
}

/// Substring filter on package names. Blank means "keep everything".
#[derive(Debug, Clone, Default)]
pub struct NameFilter(Option<String>);

impl NameFilter {
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            Self(None)
        } else {
            Self(Some(pattern.to_string()))
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0
            .as_deref()
            .map(|pattern| name.contains(pattern))
            .unwrap_or(false)
    }
}

struct Frame {
    node: NodeId,
    dependencies: Vec<Dependency>,
    cursor: usize,
    children: Vec<NodeId>,
}

impl Frame {
    fn new(node: NodeId, manifest: Manifest) -> Self {
        Self {
            node,
            dependencies: manifest.dependencies,
            cursor: 0,
            children: Vec::new(),
        }
    }
}

struct Traversal<'a, S: ?Sized> {
    source: &'a S,
    filter: NameFilter,
    root: NodeId,
    graph: DependencyGraph,
    visited: HashSet<NodeId>,
    active: HashSet<NodeId>,
    resolved: HashMap<(String, Option<String>), NodeId>,
    stack: Vec<Frame>,
}

/// Builds the dependency graph reachable from `root`.
///
/// Depth-first over the source's manifests, in declaration order, using an
/// explicit stack. Cycles terminate: an edge into a node still being
/// expanded is kept, the node is not re-entered. With a non-blank `filter`:
///
/// * a dependency whose declared name contains the filter is dropped before
///   it is fetched, leaving neither an edge nor a node;
/// * a fetched non-root package whose own name contains the filter is kept
///   as a sink with no dependencies.
///
/// The root itself is never filtered. Failing to resolve the root is
/// [`DepgraphError::RootNotFound`]; any later failure aborts the build.
pub fn build_graph<S>(
    root: &str,
    specifier: Option<&str>,
    source: &S,
    filter: &str,
) -> Result<BuiltGraph>
where
    S: ManifestSource + ?Sized,
{
    let manifest =
        source
            .resolve_root(root, specifier)
            .map_err(|source| DepgraphError::RootNotFound {
                name: root.to_string(),
                source,
            })?;
    let root_node = manifest.node_id();
    debug!(root = %root_node, "building dependency graph");

    let mut traversal = Traversal {
        source,
        filter: NameFilter::new(filter),
        root: root_node.clone(),
        graph: DependencyGraph::new(),
        visited: HashSet::new(),
        active: HashSet::new(),
        resolved: HashMap::new(),
        stack: Vec::new(),
    };
    traversal
        .resolved
        .insert(request_key(root, specifier), root_node.clone());
    traversal.enter(root_node.clone(), manifest);
    traversal.run()?;

    Ok(BuiltGraph {
        graph: traversal.graph,
        root: root_node,
    })
}

impl<S: ManifestSource + ?Sized> Traversal<'_, S> {
    fn run(&mut self) -> Result<()> {
        while let Some(frame) = self.stack.last_mut() {
            let Some(dependency) = frame.dependencies.get(frame.cursor).cloned() else {
                self.leave();
                continue;
            };
            frame.cursor += 1;

            if self.filter.matches(&dependency.name) {
                trace!(from = %frame.node, dependency = %dependency.name, "filtered out");
                continue;
            }

            let key = request_key(&dependency.name, dependency.specifier.as_deref());
            if let Some(node) = self.resolved.get(&key) {
                frame.children.push(node.clone());
                continue;
            }

            let manifest = self
                .source
                .resolve(&dependency.name, dependency.specifier.as_deref())
                .map_err(|source| DepgraphError::ManifestFetch {
                    name: dependency.name.clone(),
                    source,
                })?;
            let child = manifest.node_id();
            frame.children.push(child.clone());
            self.resolved.insert(key, child.clone());
            self.enter(child, manifest);
        }
        Ok(())
    }

    fn enter(&mut self, node: NodeId, manifest: Manifest) {
        if self.active.contains(&node) {
            trace!(%node, "cycle edge");
            return;
        }
        if self.visited.contains(&node) {
            return;
        }
        self.visited.insert(node.clone());

        if node != self.root && self.filter.matches(&manifest.name) {
            debug!(%node, "filtered package kept as sink");
            self.graph.edges.entry(node).or_default();
            return;
        }

        debug!(%node, dependencies = manifest.dependencies.len(), "expanding");
        self.active.insert(node.clone());
        self.stack.push(Frame::new(node, manifest));
    }

    fn leave(&mut self) {
        if let Some(frame) = self.stack.pop() {
            self.active.remove(&frame.node);
            self.graph.edges.insert(frame.node, frame.children);
        }
    }
}

fn request_key(name: &str, specifier: Option<&str>) -> (String, Option<String>) {
    (name.to_string(), specifier.map(str::to_string))
}
