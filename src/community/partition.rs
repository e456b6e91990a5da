//! Connected components of a node set.

use crate::graph::{KeywordGraph, NodeSet};

/// Split `nodes` into connected components.
///
/// Purely structural: edge weights are never inspected. Components are
/// emitted in order of their smallest node index.
pub fn partition(graph: &KeywordGraph, nodes: NodeSet) -> Vec<NodeSet> {
    let mut remaining = nodes;
    let mut components = Vec::new();
    while let Some(&start) = remaining.iter().next() {
        let component = graph.reachable_within(start, &remaining);
        remaining.retain(|ix| !component.contains(ix));
        components.push(component);
    }
    components
}
