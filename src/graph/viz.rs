use std::collections::HashSet;

use crate::core::manifest::NodeId;
use crate::graph::DependencyGraph;

pub const REPEAT_MARKER: &str = "[repeat]";

/// ASCII tree rooted at `root`, children in stored order. A node printed
/// anywhere earlier in the tree is shown again as a `[repeat]` leaf.
pub fn render_tree(graph: &DependencyGraph, root: &NodeId) -> String {
    let mut out = String::new();
    let mut printed = HashSet::new();
    render_tree_node(graph, root, "", true, &mut printed, &mut out);
    out
}

fn render_tree_node<'a>(
    graph: &'a DependencyGraph,
    node: &'a NodeId,
    prefix: &str,
    is_last: bool,
    printed: &mut HashSet<&'a NodeId>,
    out: &mut String,
) {
    out.push_str(prefix);
    out.push_str(connector(is_last));
    out.push_str(node.as_str());
    out.push('\n');
    printed.insert(node);

    let mut child_prefix = prefix.to_string();
    child_prefix.push_str(if is_last { "    " } else { "│   " });

    let children = graph.dependencies_of(node);
    for (idx, child) in children.iter().enumerate() {
        let last = idx + 1 == children.len();
        if printed.contains(child) {
            out.push_str(&child_prefix);
            out.push_str(connector(last));
            out.push_str(child.as_str());
            out.push(' ');
            out.push_str(REPEAT_MARKER);
            out.push('\n');
            continue;
        }
        render_tree_node(graph, child, &child_prefix, last, printed, out);
    }
}

fn connector(is_last: bool) -> &'static str {
    if is_last {
        "└── "
    } else {
        "├── "
    }
}

/// Graphviz description with nodes and their targets sorted, so the output
/// does not depend on traversal order.
pub fn render_dot(graph: &DependencyGraph) -> String {
    let mut out = String::from("digraph dependencies {\n");
    let mut nodes: Vec<&NodeId> = graph.nodes().collect();
    nodes.sort();
    for node in nodes {
        let mut deps: Vec<&NodeId> = graph.dependencies_of(node).iter().collect();
        deps.sort();
        for dep in deps {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                escape_dot_id(node.as_str()),
                escape_dot_id(dep.as_str())
            ));
        }
    }
    out.push_str("}\n");
    out
}

fn escape_dot_id(id: &str) -> String {
    id.replace('\\', "\\\\").replace('"', "\\\"")
}
