//! Community detection traits.

use crate::graph::{EdgeKey, IdAllocator, KeywordGraph, NodeIndex, NodeSet};

/// A node cloned across a cut to keep a strong directional affinity visible
/// on both sides of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplication {
    /// Node whose keyword was cloned.
    pub original: NodeIndex,
    /// The fresh node carrying the clone.
    pub ghost: NodeIndex,
    /// Node on the other side of the cut the ghost is linked to.
    pub anchor: NodeIndex,
    /// Key of the edge whose removal triggered the duplication.
    pub cut: EdgeKey,
}

/// Result of running detection over one or more node sets.
#[derive(Debug, Clone, Default)]
pub struct Detection {
    /// Accepted communities, each a connected node set of the graph.
    pub communities: Vec<NodeSet>,
    /// Ghost nodes created while splitting.
    pub duplications: Vec<Duplication>,
    /// Number of stop-or-cut rounds performed.
    pub rounds: usize,
}

impl Detection {
    /// Append another detection's results.
    pub fn extend(&mut self, other: Detection) {
        self.communities.extend(other.communities);
        self.duplications.extend(other.duplications);
        self.rounds += other.rounds;
    }
}

/// Trait for community detection algorithms on keyword graphs.
pub trait CommunityDetection {
    /// Split a connected node set into communities.
    ///
    /// May mutate the graph: edges are removed and ghost nodes added.
    fn detect(&self, graph: &mut KeywordGraph, nodes: NodeSet, ids: &mut IdAllocator) -> Detection;
}
