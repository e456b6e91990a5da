//! Keyword graph construction from a corpus.
//!
//! Three passes over the corpus:
//!
//! 1. **Nodes**: one node per base form; `tf` counts the documents the keyword
//!    occurs in, `df` is copied from the corpus DF map.
//! 2. **Edges**: one edge per unordered pair of keywords co-occurring in a
//!    document; `df` counts documents, not occurrences.
//! 3. **Filter**: drop weak edges, then compute conditional probabilities on
//!    the survivors.
//!
//! ```text
//! keep(e) ⇔ df(e) ≥ minEdgeDF  ∧  df(e) / (df(n1) + df(n2) − df(e)) ≥ minEdgeCorrelation
//! ```
//!
//! Edge construction is O(Σ_d k_d²) for k_d keywords in document d, which is
//! the dominant cost on long documents.

use super::{IdAllocator, KeywordEdge, KeywordGraph, KeywordNode, NodeIndex, NodeKeyword};
use crate::config::Config;
use crate::corpus::Corpus;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Builds a [`KeywordGraph`] from a corpus snapshot.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    min_edge_df: usize,
    min_edge_correlation: f64,
}

impl GraphBuilder {
    /// Create a builder with the default thresholds.
    pub fn new() -> Self {
        let defaults = Config::default();
        Self {
            min_edge_df: defaults.min_edge_df,
            min_edge_correlation: defaults.min_edge_correlation,
        }
    }

    /// Create a builder from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_edge_df: config.min_edge_df,
            min_edge_correlation: config.min_edge_correlation,
        }
    }

    /// Set the minimum edge document frequency.
    pub fn with_min_edge_df(mut self, min_edge_df: usize) -> Self {
        self.min_edge_df = min_edge_df;
        self
    }

    /// Set the minimum edge correlation.
    pub fn with_min_edge_correlation(mut self, min_edge_correlation: f64) -> Self {
        self.min_edge_correlation = min_edge_correlation;
        self
    }

    /// Build the filtered keyword graph.
    pub fn build(&self, corpus: &Corpus, ids: &mut IdAllocator) -> KeywordGraph {
        let mut graph = KeywordGraph::new();
        let mut index: BTreeMap<&str, NodeIndex> = BTreeMap::new();

        for doc in corpus.docs().values() {
            for keyword in doc.keywords().values() {
                let ix = *index.entry(keyword.base_form.as_str()).or_insert_with(|| {
                    let df = corpus.df(&keyword.base_form).unwrap_or(0);
                    graph.add_node(KeywordNode {
                        id: ids.next_node_id(),
                        keyword: NodeKeyword::new(&keyword.base_form, &keyword.word, df),
                    })
                });
                if let Some(node) = graph.node_mut(ix) {
                    if node.keyword.documents.insert(doc.id.clone()) {
                        node.keyword.tf += 1.0;
                    }
                }
            }
        }

        let mut edges: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
        for doc in corpus.docs().values() {
            let nodes: Vec<NodeIndex> = doc
                .keywords()
                .keys()
                .filter_map(|base_form| index.get(base_form.as_str()).copied())
                .collect();
            // keywords() iterates in base-form order, so `a` is always the smaller key
            for (i, &a) in nodes.iter().enumerate() {
                for &b in &nodes[i + 1..] {
                    *edges.entry((a, b)).or_insert(0) += 1;
                }
            }
        }

        let mut pairs: Vec<((NodeIndex, NodeIndex), usize)> = edges.into_iter().collect();
        pairs.sort_unstable_by_key(|&(pair, _)| pair);

        let candidates = pairs.len();
        for ((a, b), df) in pairs {
            let (Some(n1), Some(n2)) = (graph.node(a), graph.node(b)) else {
                continue;
            };
            if !self.keeps(df, n1.keyword.df, n2.keyword.df) {
                continue;
            }
            let mut edge = KeywordEdge::with_df(df);
            edge.compute_cps(n1.keyword.tf, n2.keyword.tf);
            let _ = graph.add_edge(a, b, edge);
        }

        debug!(
            nodes = graph.node_count(),
            candidate_edges = candidates,
            edges = graph.edge_count(),
            "built keyword graph"
        );
        graph
    }

    /// Edge filter on co-occurrence count and correlation.
    ///
    /// A non-positive union size means the DF map is inconsistent with the
    /// co-occurrence count; the correlation is then treated as 0.
    fn keeps(&self, df: usize, df1: usize, df2: usize) -> bool {
        if df < self.min_edge_df {
            return false;
        }
        let union = df1 as f64 + df2 as f64 - df as f64;
        let correlation = if union > 0.0 { df as f64 / union } else { 0.0 };
        correlation >= self.min_edge_correlation
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
