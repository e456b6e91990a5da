//! Keyword co-occurrence graph.
//!
//! Nodes are keywords, edges connect keywords that co-occur in enough
//! documents. The graph is stored as a petgraph `StableUnGraph` arena so that
//! node and edge indices stay valid while detection removes edges and adds
//! ghost nodes; communities are then just sets of node indices into the arena.
//!
//! ## Edge statistics
//!
//! ```text
//! df(e)  = #documents containing both keywords
//! cp1(e) = df(e) / tf(node1)     ≈ P(node2 | node1)
//! cp2(e) = df(e) / tf(node2)     ≈ P(node1 | node2)
//! ```
//!
//! `node1` is the endpoint the edge was created from. For builder edges that
//! is the endpoint with the smaller base form.

mod builder;
mod ids;

pub use builder::GraphBuilder;
pub use ids::{EventId, IdAllocator, NodeId};
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};

use crate::corpus::DocId;
use petgraph::stable_graph::StableUnGraph;
use petgraph::visit::{Bfs, EdgeRef, NodeFiltered};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A set of node indices into a [`KeywordGraph`].
pub type NodeSet = BTreeSet<NodeIndex>;

/// Canonical identity of an undirected edge: the two endpoint keys, smaller first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeKey {
    low: String,
    high: String,
}

impl EdgeKey {
    /// Build the key for the pair `(a, b)`. Symmetric in its arguments.
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    /// The lexicographically smaller key.
    pub fn low(&self) -> &str {
        &self.low
    }

    /// The lexicographically larger key.
    pub fn high(&self) -> &str {
        &self.high
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.low, self.high)
    }
}

/// Keyword statistics aggregated over the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeKeyword {
    /// Canonical form.
    pub base_form: String,
    /// Surface form of the first occurrence.
    pub word: String,
    /// Number of documents the keyword was seen in during graph construction.
    pub tf: f64,
    /// Corpus-level document frequency.
    pub df: usize,
    /// Documents containing this keyword (lookup only).
    pub documents: BTreeSet<DocId>,
}

impl NodeKeyword {
    /// Create a keyword with no documents and zero tf.
    pub fn new(base_form: impl Into<String>, word: impl Into<String>, df: usize) -> Self {
        Self {
            base_form: base_form.into(),
            word: word.into(),
            tf: 0.0,
            df,
            documents: BTreeSet::new(),
        }
    }
}

/// A node of the keyword graph.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordNode {
    /// Run-unique id.
    pub id: NodeId,
    /// The keyword this node stands for.
    pub keyword: NodeKeyword,
}

/// Co-occurrence statistics of an edge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordEdge {
    /// Number of documents containing both endpoints.
    pub df: usize,
    /// `df / tf(node1)`.
    pub cp1: f64,
    /// `df / tf(node2)`.
    pub cp2: f64,
    /// Edge betweenness from the most recent detection round.
    pub betweenness: f64,
}

impl KeywordEdge {
    /// Edge with the given co-occurrence count and no probabilities yet.
    pub fn with_df(df: usize) -> Self {
        Self {
            df,
            ..Self::default()
        }
    }

    /// Fill `cp1`/`cp2` from the endpoints' tf. A zero tf yields 0.
    pub fn compute_cps(&mut self, tf1: f64, tf2: f64) {
        let df = self.df as f64;
        self.cp1 = if tf1 > 0.0 { df / tf1 } else { 0.0 };
        self.cp2 = if tf2 > 0.0 { df / tf2 } else { 0.0 };
    }

    /// The stronger of the two conditional probabilities.
    pub fn strength(&self) -> f64 {
        self.cp1.max(self.cp2)
    }
}

/// Arena of keyword nodes and co-occurrence edges.
#[derive(Debug, Clone, Default)]
pub struct KeywordGraph {
    graph: StableUnGraph<KeywordNode, KeywordEdge>,
}

impl KeywordGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of live edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Add a node.
    pub fn add_node(&mut self, node: KeywordNode) -> NodeIndex {
        self.graph.add_node(node)
    }

    /// Add an edge; `node1` becomes the endpoint `cp1` is conditioned on.
    ///
    /// Callers are responsible for keeping at most one edge per pair.
    pub fn add_edge(&mut self, node1: NodeIndex, node2: NodeIndex, edge: KeywordEdge) -> EdgeIndex {
        self.graph.add_edge(node1, node2, edge)
    }

    /// Node payload.
    pub fn node(&self, ix: NodeIndex) -> Option<&KeywordNode> {
        self.graph.node_weight(ix)
    }

    /// Mutable node payload.
    pub fn node_mut(&mut self, ix: NodeIndex) -> Option<&mut KeywordNode> {
        self.graph.node_weight_mut(ix)
    }

    /// Edge payload.
    pub fn edge(&self, e: EdgeIndex) -> Option<&KeywordEdge> {
        self.graph.edge_weight(e)
    }

    /// Mutable edge payload.
    pub fn edge_mut(&mut self, e: EdgeIndex) -> Option<&mut KeywordEdge> {
        self.graph.edge_weight_mut(e)
    }

    /// `(node1, node2)` of an edge.
    pub fn endpoints(&self, e: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(e)
    }

    /// Base form of a node, if it exists.
    pub fn base_form(&self, ix: NodeIndex) -> Option<&str> {
        self.node(ix).map(|n| n.keyword.base_form.as_str())
    }

    /// Canonical key of an edge.
    pub fn edge_key(&self, e: EdgeIndex) -> Option<EdgeKey> {
        let (a, b) = self.endpoints(e)?;
        Some(EdgeKey::new(self.base_form(a)?, self.base_form(b)?))
    }

    /// All live node indices, in index order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// All live edge indices, in index order.
    pub fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    /// All node indices as a set.
    pub fn all_nodes(&self) -> NodeSet {
        self.graph.node_indices().collect()
    }

    /// Incident edges of a node as `(edge, opposite node)` pairs.
    pub fn incident(&self, ix: NodeIndex) -> Vec<(EdgeIndex, NodeIndex)> {
        self.graph
            .edges(ix)
            .map(|er| {
                let other = if er.source() == ix { er.target() } else { er.source() };
                (er.id(), other)
            })
            .collect()
    }

    /// Number of incident edges.
    pub fn degree(&self, ix: NodeIndex) -> usize {
        self.graph.edges(ix).count()
    }

    /// Remove an edge from both endpoints.
    pub fn remove_edge(&mut self, e: EdgeIndex) -> Option<KeywordEdge> {
        self.graph.remove_edge(e)
    }

    /// Remove a node together with its incident edges.
    pub fn remove_node(&mut self, ix: NodeIndex) -> Option<KeywordNode> {
        self.graph.remove_node(ix)
    }

    /// First node (by id) carrying the given base form.
    pub fn find_node(&self, base_form: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&ix| self.base_form(ix) == Some(base_form))
            .min_by_key(|&ix| self.graph[ix].id)
    }

    /// Edge between the first nodes carrying the two base forms.
    pub fn find_edge(&self, a: &str, b: &str) -> Option<EdgeIndex> {
        self.graph.find_edge(self.find_node(a)?, self.find_node(b)?)
    }

    /// Edges with both endpoints inside `nodes`.
    pub fn edges_within(&self, nodes: &NodeSet) -> BTreeSet<EdgeIndex> {
        nodes
            .iter()
            .flat_map(|&ix| self.graph.edges(ix))
            .filter(|er| nodes.contains(&er.source()) && nodes.contains(&er.target()))
            .map(|er| er.id())
            .collect()
    }

    /// Nodes of `within` reachable from `start` without leaving `within`.
    pub fn reachable_within(&self, start: NodeIndex, within: &NodeSet) -> NodeSet {
        let mut reached = NodeSet::new();
        if !within.contains(&start) {
            return reached;
        }
        let filtered = NodeFiltered::from_fn(&self.graph, |ix| within.contains(&ix));
        let mut bfs = Bfs::new(&filtered, start);
        while let Some(ix) = bfs.next(&filtered) {
            let _ = reached.insert(ix);
        }
        reached
    }

    /// Whether every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        match self.graph.node_indices().next() {
            None => true,
            Some(start) => self.reachable_within(start, &self.all_nodes()).len() == self.node_count(),
        }
    }

    /// Copy the nodes in `nodes` and the edges among them into a fresh graph.
    ///
    /// Edge orientation (`node1`/`node2`) and statistics are preserved.
    pub fn subgraph(&self, nodes: &NodeSet) -> KeywordGraph {
        let mut out = KeywordGraph::new();
        let mut mapping: BTreeMap<NodeIndex, NodeIndex> = BTreeMap::new();
        for &ix in nodes {
            if let Some(node) = self.node(ix) {
                let _ = mapping.insert(ix, out.add_node(node.clone()));
            }
        }
        for e in self.edges_within(nodes) {
            let (Some((a, b)), Some(edge)) = (self.endpoints(e), self.edge(e)) else {
                continue;
            };
            if let (Some(&na), Some(&nb)) = (mapping.get(&a), mapping.get(&b)) {
                let _ = out.add_edge(na, nb, edge.clone());
            }
        }
        out
    }

    /// Union of two key graphs by base form.
    ///
    /// A base form present in both keeps the first graph's node; an edge
    /// present in both keeps the first graph's statistics.
    pub fn merge(first: &KeywordGraph, second: &KeywordGraph) -> KeywordGraph {
        let mut out = KeywordGraph::new();
        let mut by_base: BTreeMap<String, NodeIndex> = BTreeMap::new();
        for g in [first, second] {
            for ix in g.node_indices() {
                let node = &g.graph[ix];
                if !by_base.contains_key(&node.keyword.base_form) {
                    let nx = out.add_node(node.clone());
                    let _ = by_base.insert(node.keyword.base_form.clone(), nx);
                }
            }
        }
        for g in [first, second] {
            for e in g.edge_indices() {
                let Some((a, b)) = g.endpoints(e) else { continue };
                let (Some(&na), Some(&nb)) = (
                    by_base.get(&g.graph[a].keyword.base_form),
                    by_base.get(&g.graph[b].keyword.base_form),
                ) else {
                    continue;
                };
                if na != nb && out.graph.find_edge(na, nb).is_none() {
                    let _ = out.add_edge(na, nb, g.graph[e].clone());
                }
            }
        }
        out
    }
}
