//! Size-based routing of graph components.
//!
//! Components are kept on a deque and handled front first:
//!
//! | size n | action |
//! |--------|--------|
//! | n < minClusterNodeSize | discard |
//! | n > maxClusterNodeSize | drop the weakest 1% of edges, re-partition, push the parts to the front |
//! | otherwise | hand to the configured [`CommunityDetection`] algorithm |
//!
//! Pushing shrunk parts to the front exhausts one oversized component before
//! its older siblings are touched. Shrinking only looks at edge strength
//! (`max(cp1, cp2)`, then `df`), which is O(E); betweenness is reserved for
//! components small enough to afford it.

use super::betweenness::BetweennessSplitter;
use super::partition::partition;
use super::traits::{CommunityDetection, Detection};
use crate::config::{CommunityDetectAlg, Config};
use crate::error::Result;
use crate::graph::{EdgeIndex, EdgeKey, IdAllocator, KeywordGraph, NodeSet};
use std::cmp::Ordering;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Percentage of a component's edges removed per shrink step.
const SHRINK_PERCENT: f64 = 1.0;

/// Orchestrates partitioning, size routing, and community detection.
#[derive(Debug, Clone)]
pub struct CommunityDetector {
    min_cluster_node_size: usize,
    max_cluster_node_size: usize,
    algorithm: CommunityDetectAlg,
    splitter: BetweennessSplitter,
}

impl CommunityDetector {
    /// Create a detector from configuration.
    ///
    /// # Errors
    ///
    /// Fails if the configuration does not validate, including an unsupported
    /// `communityDetectAlg`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let algorithm = config.validate()?;
        Ok(Self {
            min_cluster_node_size: config.min_cluster_node_size,
            max_cluster_node_size: config.max_cluster_node_size,
            algorithm,
            splitter: BetweennessSplitter::from_config(config),
        })
    }

    fn algorithm(&self) -> &dyn CommunityDetection {
        match self.algorithm {
            CommunityDetectAlg::Betweenness => &self.splitter,
        }
    }

    /// Detect communities over the whole graph.
    ///
    /// The graph is consumed destructively: weak and high-betweenness edges
    /// are removed and ghost nodes may be added.
    pub fn detect(&self, graph: &mut KeywordGraph, ids: &mut IdAllocator) -> Detection {
        let mut worklist: VecDeque<NodeSet> = partition(graph, graph.all_nodes()).into();
        let mut detection = Detection::default();
        let mut discarded = 0usize;
        let mut shrinks = 0usize;

        while let Some(component) = worklist.pop_front() {
            let n = component.len();
            if n < self.min_cluster_node_size {
                discarded += 1;
                continue;
            }
            if n > self.max_cluster_node_size {
                let removed = remove_weakest_edges(graph, &component, SHRINK_PERCENT);
                if removed == 0 {
                    warn!(nodes = n, "oversized component has no edges to remove, discarding");
                    continue;
                }
                shrinks += 1;
                let parts = partition(graph, component);
                debug!(nodes = n, removed, parts = parts.len(), "shrunk oversized component");
                for part in parts.into_iter().rev() {
                    worklist.push_front(part);
                }
                continue;
            }
            detection.extend(self.algorithm().detect(graph, component, ids));
        }

        info!(
            communities = detection.communities.len(),
            duplicated = detection.duplications.len(),
            discarded,
            shrinks,
            "community detection finished"
        );
        detection
    }
}

/// Strength comparator: higher `max(cp1, cp2)` is stronger, then higher `df`,
/// then the smaller edge key. Betweenness is never consulted.
fn compare_strength(graph: &KeywordGraph, a: &(EdgeIndex, EdgeKey), b: &(EdgeIndex, EdgeKey)) -> Ordering {
    let (Some(ea), Some(eb)) = (graph.edge(a.0), graph.edge(b.0)) else {
        return Ordering::Equal;
    };
    ea.strength()
        .total_cmp(&eb.strength())
        .then(ea.df.cmp(&eb.df))
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| b.0.cmp(&a.0))
}

/// Remove the weakest `percent`% of the edges inside `nodes`, at least one.
///
/// Returns the number of edges removed.
pub fn remove_weakest_edges(graph: &mut KeywordGraph, nodes: &NodeSet, percent: f64) -> usize {
    let mut edges: Vec<(EdgeIndex, EdgeKey)> = graph
        .edges_within(nodes)
        .into_iter()
        .filter_map(|e| Some((e, graph.edge_key(e)?)))
        .collect();
    if edges.is_empty() {
        return 0;
    }
    let k = ((edges.len() as f64 * percent / 100.0) as usize).clamp(1, edges.len());
    if k < edges.len() {
        let _ = edges.select_nth_unstable_by(k - 1, |a, b| compare_strength(graph, a, b));
        edges.truncate(k);
    }
    for (e, _) in &edges {
        let _ = graph.remove_edge(*e);
    }
    k
}
