//! Girvan–Newman style community splitting on edge betweenness.
//!
//! ## The Algorithm
//!
//! Repeatedly cut the edge that the most shortest paths run through, until
//! no edge stands out any more:
//!
//! 1. Recompute every edge's betweenness from scratch: one unweighted BFS per
//!    source node, crediting each edge on the BFS-tree path back to the source.
//!    Every path is counted once from each end, so the totals are halved.
//! 2. Pick the maximum-betweenness edge. Edges touching a node of degree < 2
//!    never qualify; ties go to the higher `df`, then to the smaller edge key.
//! 3. Stop and accept the node set as a community unless
//!
//!    ```text
//!    n > minClusterNodeSize  ∧  df(e) > 0  ∧  betweenness(e) > 4.2 · log2(P) + 1
//!    P = min(n(n−1)/2, cap(cap−1)/2),  cap = maxClusterNodeSize
//!    ```
//!
//! 4. Otherwise remove the edge. If the graph stays connected, go again on the
//!    same nodes; if it falls apart, optionally clone a strongly implied
//!    endpoint across the cut, then process both halves independently.
//!
//! The recursion of the textbook formulation is an explicit stack here: the
//! depth is bounded by the number of successful splits, which is linear in
//! the node count on adversarial inputs.
//!
//! ## Termination
//!
//! Each round either accepts a node set or removes one edge that existed
//! before the round. Ghost edges hang off a fresh leaf and carry `df = 0`, so
//! they can never be selected for removal. Rounds are therefore bounded by `2E + 1`.
//!
//! ## References
//!
//! Girvan & Newman (2002). "Community structure in social and biological networks."
//! PNAS 99(12), 7821–7826.

use super::traits::{CommunityDetection, Detection, Duplication};
use crate::config::Config;
use crate::graph::{
    EdgeIndex, EdgeKey, IdAllocator, KeywordEdge, KeywordGraph, KeywordNode, NodeIndex, NodeSet,
};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Compute edge betweenness for every edge inside `nodes`, writing it into
/// [`KeywordEdge::betweenness`](crate::graph::KeywordEdge::betweenness).
///
/// Paths are unweighted BFS-tree paths: where several shortest paths exist,
/// only the first one discovered is credited.
pub fn edge_betweenness(graph: &mut KeywordGraph, nodes: &NodeSet) {
    let adjacency: HashMap<NodeIndex, Vec<(EdgeIndex, NodeIndex)>> = nodes
        .iter()
        .map(|&ix| {
            let incident = graph
                .incident(ix)
                .into_iter()
                .filter(|(_, other)| nodes.contains(other))
                .collect();
            (ix, incident)
        })
        .collect();

    let mut counts: HashMap<EdgeIndex, u64> = HashMap::new();
    for &source in nodes {
        // scratch state, valid for this traversal only
        let mut prev: HashMap<NodeIndex, (EdgeIndex, NodeIndex)> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([source]);
        let mut queue = VecDeque::from([source]);
        let mut reached = Vec::new();

        while let Some(n) = queue.pop_front() {
            for &(e, next) in adjacency.get(&n).into_iter().flatten() {
                if visited.insert(next) {
                    let _ = prev.insert(next, (e, n));
                    reached.push(next);
                    queue.push_back(next);
                }
            }
        }

        for target in reached {
            let mut cur = target;
            while let Some(&(e, back)) = prev.get(&cur) {
                *counts.entry(e).or_insert(0) += 1;
                cur = back;
            }
        }
    }

    for e in graph.edges_within(nodes) {
        if let Some(edge) = graph.edge_mut(e) {
            edge.betweenness = counts.get(&e).copied().unwrap_or(0) as f64 / 2.0;
        }
    }
}

/// Betweenness-based recursive splitter.
#[derive(Debug, Clone)]
pub struct BetweennessSplitter {
    /// Node sets at or below this size are accepted without further splitting.
    min_cluster_node_size: usize,
    /// Caps the pair count used by the stopping threshold.
    max_cluster_node_size: usize,
    /// Cut edges with a conditional probability above this are duplicated.
    min_cp_to_duplicate_edge: f64,
}

impl BetweennessSplitter {
    /// Create a splitter with the default thresholds.
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create a splitter from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_cluster_node_size: config.min_cluster_node_size,
            max_cluster_node_size: config.max_cluster_node_size,
            min_cp_to_duplicate_edge: config.min_cp_to_duplicate_edge,
        }
    }

    /// Set the minimum community size.
    pub fn with_min_cluster_node_size(mut self, size: usize) -> Self {
        self.min_cluster_node_size = size;
        self
    }

    /// Set the size cap used by the stopping threshold.
    pub fn with_max_cluster_node_size(mut self, size: usize) -> Self {
        self.max_cluster_node_size = size;
        self
    }

    /// Set the duplication threshold.
    pub fn with_min_cp_to_duplicate_edge(mut self, cp: f64) -> Self {
        self.min_cp_to_duplicate_edge = cp;
        self
    }

    /// Betweenness an edge must exceed for a node set of size `n` to be split.
    ///
    /// Infinite when fewer than one node pair exists.
    pub fn threshold(&self, n: usize) -> f64 {
        let pairs = |k: usize| (k as u64) * (k.saturating_sub(1) as u64) / 2;
        let possible = pairs(n).min(pairs(self.max_cluster_node_size));
        if possible == 0 {
            return f64::INFINITY;
        }
        4.2 * (possible as f64).log2() + 1.0
    }

    /// The edge to cut next, by the betweenness comparator.
    ///
    /// Assumes [`edge_betweenness`] has just been run on `nodes`.
    pub fn max_edge(&self, graph: &KeywordGraph, nodes: &NodeSet) -> Option<EdgeIndex> {
        let keys: HashMap<EdgeIndex, EdgeKey> = graph
            .edges_within(nodes)
            .into_iter()
            .filter(|&e| {
                graph
                    .endpoints(e)
                    .is_some_and(|(a, b)| graph.degree(a) >= 2 && graph.degree(b) >= 2)
            })
            .filter_map(|e| Some((e, graph.edge_key(e)?)))
            .collect();

        keys.keys()
            .copied()
            .max_by(|&a, &b| compare_betweenness(graph, &keys, a, b))
    }

    fn keeps_splitting(&self, graph: &KeywordGraph, n: usize, max: Option<EdgeIndex>) -> bool {
        let Some(edge) = max.and_then(|e| graph.edge(e)) else {
            return false;
        };
        n > self.min_cluster_node_size && edge.df > 0 && edge.betweenness > self.threshold(n)
    }

    /// Clone `original`'s keyword into a fresh node linked to `anchor`.
    ///
    /// The ghost references no documents and its edge has `df = 0` and zero
    /// conditional probabilities, so it adds vocabulary to the anchor's side
    /// without adding weight or candidate documents.
    fn duplicate(
        &self,
        graph: &mut KeywordGraph,
        original: NodeIndex,
        anchor: NodeIndex,
        anchor_is_node1: bool,
        ids: &mut IdAllocator,
    ) -> Option<NodeIndex> {
        let mut keyword = graph.node(original)?.keyword.clone();
        keyword.documents.clear();
        let ghost = graph.add_node(KeywordNode {
            id: ids.next_node_id(),
            keyword,
        });
        let edge = KeywordEdge::with_df(0);
        let _ = if anchor_is_node1 {
            graph.add_edge(anchor, ghost, edge)
        } else {
            graph.add_edge(ghost, anchor, edge)
        };
        Some(ghost)
    }
}

impl Default for BetweennessSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Betweenness comparator: higher score wins, then higher `df`, then the
/// smaller edge key, then the smaller index.
fn compare_betweenness(
    graph: &KeywordGraph,
    keys: &HashMap<EdgeIndex, EdgeKey>,
    a: EdgeIndex,
    b: EdgeIndex,
) -> Ordering {
    let (Some(ea), Some(eb)) = (graph.edge(a), graph.edge(b)) else {
        return Ordering::Equal;
    };
    ea.betweenness
        .total_cmp(&eb.betweenness)
        .then(ea.df.cmp(&eb.df))
        .then_with(|| keys.get(&b).cmp(&keys.get(&a)))
        .then_with(|| b.cmp(&a))
}

impl CommunityDetection for BetweennessSplitter {
    fn detect(&self, graph: &mut KeywordGraph, nodes: NodeSet, ids: &mut IdAllocator) -> Detection {
        let mut detection = Detection::default();
        let mut pending = vec![nodes];

        while let Some(nodes) = pending.pop() {
            detection.rounds += 1;

            edge_betweenness(graph, &nodes);
            let max = self.max_edge(graph, &nodes);
            if !self.keeps_splitting(graph, nodes.len(), max) {
                detection.communities.push(nodes);
                continue;
            }
            let Some(max) = max else { continue };
            let (Some((n1, n2)), Some(key)) = (graph.endpoints(max), graph.edge_key(max)) else {
                continue;
            };
            let Some(cut) = graph.remove_edge(max) else { continue };

            let mut side1 = graph.reachable_within(n1, &nodes);
            if side1.len() == nodes.len() {
                pending.push(nodes);
                continue;
            }
            let mut side2: NodeSet = nodes.difference(&side1).copied().collect();
            debug!(
                edge = %key,
                betweenness = cut.betweenness,
                left = side1.len(),
                right = side2.len(),
                "split community"
            );

            if cut.cp1 > self.min_cp_to_duplicate_edge {
                if let Some(ghost) = self.duplicate(graph, n2, n1, true, ids) {
                    let _ = side1.insert(ghost);
                    detection.duplications.push(Duplication {
                        original: n2,
                        ghost,
                        anchor: n1,
                        cut: key.clone(),
                    });
                }
            }
            if cut.cp2 > self.min_cp_to_duplicate_edge {
                if let Some(ghost) = self.duplicate(graph, n1, n2, false, ids) {
                    let _ = side2.insert(ghost);
                    detection.duplications.push(Duplication {
                        original: n1,
                        ghost,
                        anchor: n2,
                        cut: key,
                    });
                }
            }

            // endpoint-1's side is processed first
            pending.push(side2);
            pending.push(side1);
        }

        detection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Corpus, Document};
    use crate::event::CommunityVector;
    use crate::graph::tests::graph_from;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    fn betweenness(g: &KeywordGraph, a: &str, b: &str) -> f64 {
        g.edge(g.find_edge(a, b).unwrap()).unwrap().betweenness
    }

    fn vocabularies(g: &KeywordGraph, communities: &[NodeSet]) -> BTreeSet<BTreeSet<String>> {
        communities
            .iter()
            .map(|c| c.iter().map(|&ix| g.base_form(ix).unwrap().to_string()).collect())
            .collect()
    }

    /// Two 5-cliques joined by a single bridge `a4 - b0`.
    fn barbell(ids: &mut IdAllocator, bridge_df: usize) -> KeywordGraph {
        let names: Vec<String> = (0..5)
            .map(|i| format!("a{i}"))
            .chain((0..5).map(|i| format!("b{i}")))
            .collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut edges = Vec::new();
        for side in [&refs[..5], &refs[5..]] {
            for i in 0..5 {
                for j in i + 1..5 {
                    edges.push((side[i], side[j], 3));
                }
            }
        }
        edges.push(("a4", "b0", bridge_df));
        graph_from(&refs, &edges, ids)
    }

    #[test]
    fn test_path_betweenness() {
        let mut ids = IdAllocator::new();
        let mut g = graph_from(
            &["a", "b", "c", "d"],
            &[("a", "b", 1), ("b", "c", 1), ("c", "d", 1)],
            &mut ids,
        );
        let nodes = g.all_nodes();
        edge_betweenness(&mut g, &nodes);
        assert_eq!(betweenness(&g, "a", "b"), 3.0);
        assert_eq!(betweenness(&g, "b", "c"), 4.0);
        assert_eq!(betweenness(&g, "c", "d"), 3.0);
    }

    #[test]
    fn test_betweenness_is_reset_each_round() {
        let mut ids = IdAllocator::new();
        let mut g = graph_from(&["a", "b"], &[("a", "b", 1)], &mut ids);
        let nodes = g.all_nodes();
        edge_betweenness(&mut g, &nodes);
        edge_betweenness(&mut g, &nodes);
        assert_eq!(betweenness(&g, "a", "b"), 1.0);
    }

    #[test]
    fn test_max_edge_skips_leaf_edges() {
        let mut ids = IdAllocator::new();
        let mut g = graph_from(
            &["a", "b", "c", "d"],
            &[("a", "b", 1), ("b", "c", 1), ("c", "d", 1)],
            &mut ids,
        );
        let nodes = g.all_nodes();
        edge_betweenness(&mut g, &nodes);
        let max = BetweennessSplitter::new().max_edge(&g, &nodes).unwrap();
        assert_eq!(g.edge_key(max).unwrap(), EdgeKey::new("b", "c"));

        // a star has only leaf edges
        let mut star = graph_from(
            &["hub", "x", "y", "z"],
            &[("hub", "x", 1), ("hub", "y", 1), ("hub", "z", 1)],
            &mut ids,
        );
        let nodes = star.all_nodes();
        edge_betweenness(&mut star, &nodes);
        assert!(BetweennessSplitter::new().max_edge(&star, &nodes).is_none());
    }

    #[test]
    fn test_max_edge_tie_prefers_higher_df_then_smaller_key() {
        let mut ids = IdAllocator::new();
        // triangle: every edge has betweenness 1
        let mut g = graph_from(
            &["a", "b", "c"],
            &[("a", "b", 1), ("b", "c", 1), ("a", "c", 1)],
            &mut ids,
        );
        let nodes = g.all_nodes();
        edge_betweenness(&mut g, &nodes);
        let splitter = BetweennessSplitter::new();
        let max = splitter.max_edge(&g, &nodes).unwrap();
        assert_eq!(g.edge_key(max).unwrap(), EdgeKey::new("a", "b"));

        let bc = g.find_edge("b", "c").unwrap();
        g.edge_mut(bc).unwrap().df = 7;
        let max = splitter.max_edge(&g, &nodes).unwrap();
        assert_eq!(max, bc);
    }

    #[test]
    fn test_threshold_uses_capped_pair_count() {
        let splitter = BetweennessSplitter::new().with_max_cluster_node_size(3);
        // min(45, 3) = 3 pairs
        let expected = 4.2 * 3f64.log2() + 1.0;
        assert!((splitter.threshold(10) - expected).abs() < 1e-12);
        assert_eq!(splitter.threshold(1), f64::INFINITY);
    }

    #[test]
    fn test_barbell_splits_at_bridge() {
        let mut ids = IdAllocator::new();
        let mut g = barbell(&mut ids, 3);
        let nodes = g.all_nodes();
        let splitter = BetweennessSplitter::new()
            .with_min_cluster_node_size(3)
            .with_min_cp_to_duplicate_edge(10.0);

        let detection = splitter.detect(&mut g, nodes, &mut ids);
        let vocab = vocabularies(&g, &detection.communities);
        let expected: BTreeSet<BTreeSet<String>> = [
            (0..5).map(|i| format!("a{i}")).collect(),
            (0..5).map(|i| format!("b{i}")).collect(),
        ]
        .into_iter()
        .collect();
        assert_eq!(vocab, expected);
        assert!(detection.duplications.is_empty());
        assert!(g.find_edge("a4", "b0").is_none());
    }

    #[test]
    fn test_zero_df_edge_stops_splitting() {
        let mut ids = IdAllocator::new();
        let mut g = barbell(&mut ids, 0);
        let nodes = g.all_nodes();
        let splitter = BetweennessSplitter::new()
            .with_min_cluster_node_size(3)
            .with_min_cp_to_duplicate_edge(10.0);
        let detection = splitter.detect(&mut g, nodes, &mut ids);
        assert_eq!(detection.communities.len(), 1);
        assert_eq!(detection.rounds, 1);
    }

    #[test]
    fn test_strong_cut_edge_is_duplicated() {
        let mut ids = IdAllocator::new();
        let mut g = barbell(&mut ids, 3);
        // graph_from sets tf = 1, so cp1 = cp2 = df = 3 on the bridge
        let nodes = g.all_nodes();
        let splitter = BetweennessSplitter::new()
            .with_min_cluster_node_size(3)
            .with_min_cp_to_duplicate_edge(2.5);

        let detection = splitter.detect(&mut g, nodes, &mut ids);
        assert_eq!(detection.duplications.len(), 2);
        assert!(detection
            .duplications
            .iter()
            .all(|d| d.cut == EdgeKey::new("a4", "b0")));

        for c in &detection.communities {
            let words: BTreeSet<&str> = c.iter().map(|&ix| g.base_form(ix).unwrap()).collect();
            if words.contains("a0") {
                assert!(words.contains("b0"), "ghost of b0 joins the a-side");
            } else {
                assert!(words.contains("a4"), "ghost of a4 joins the b-side");
            }
            assert!(g.subgraph(c).is_connected());
        }

        let ghost = detection.duplications[0].ghost;
        assert_eq!(g.degree(ghost), 1);
        assert_ne!(
            g.node(ghost).unwrap().id,
            g.node(detection.duplications[0].original).unwrap().id
        );
    }

    #[test]
    fn test_ghost_has_no_documents_and_a_weightless_edge() {
        let mut ids = IdAllocator::new();
        let mut g = barbell(&mut ids, 3);
        let b0 = g.find_node("b0").unwrap();
        let _ = g.node_mut(b0).unwrap().keyword.documents.insert("docB".to_string());
        let nodes = g.all_nodes();
        let splitter = BetweennessSplitter::new()
            .with_min_cluster_node_size(3)
            .with_min_cp_to_duplicate_edge(2.5);

        let detection = splitter.detect(&mut g, nodes, &mut ids);
        let dup = detection
            .duplications
            .iter()
            .find(|d| d.original == b0)
            .unwrap();
        assert_eq!(g.base_form(dup.ghost), Some("b0"));
        assert!(g.node(dup.ghost).unwrap().keyword.documents.is_empty());
        assert!(g.node(b0).unwrap().keyword.documents.contains("docB"));

        let (e, other) = g.incident(dup.ghost)[0];
        assert_eq!(other, dup.anchor);
        let edge = g.edge(e).unwrap();
        assert_eq!(edge.df, 0);
        assert_eq!(edge.cp1, 0.0);
        assert_eq!(edge.cp2, 0.0);

        // the ghost is the only b0 on the a-side, and it weighs nothing there
        let a_side = detection
            .communities
            .iter()
            .find(|c| c.contains(&dup.ghost))
            .unwrap();
        let docs = ["a0", "a1", "b0"]
            .iter()
            .map(|t| Document::new(format!("d-{t}")).with_keyword(t, 1.0))
            .chain((0..6).map(|i| Document::new(format!("f{i}")).with_keyword("filler", 1.0)));
        let corpus = Corpus::from_documents(docs);
        let vector = CommunityVector::from_graph(&g.subgraph(a_side), &corpus);
        assert_eq!(vector.weight("b0"), Some(0.0));
        assert!(vector.weight("a0").unwrap() > 0.0);
    }

    #[test]
    fn test_split_partitions_component_exactly_without_duplication() {
        let mut ids = IdAllocator::new();
        let mut g = barbell(&mut ids, 3);
        let nodes = g.all_nodes();
        let splitter = BetweennessSplitter::new()
            .with_min_cluster_node_size(1)
            .with_min_cp_to_duplicate_edge(f64::INFINITY);
        let detection = splitter.detect(&mut g, nodes.clone(), &mut ids);

        let total: usize = detection.communities.iter().map(|c| c.len()).sum();
        let union: NodeSet = detection.communities.iter().flatten().copied().collect();
        assert_eq!(total, nodes.len());
        assert_eq!(union, nodes);
    }

    fn random_graph(seed: u64, n: usize, p: f64, ids: &mut IdAllocator) -> KeywordGraph {
        let mut rng = StdRng::seed_from_u64(seed);
        let names: Vec<String> = (0..n).map(|i| format!("k{i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut edges = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                if rng.random_bool(p) {
                    edges.push((refs[i], refs[j], rng.random_range(1..5)));
                }
            }
        }
        graph_from(&refs, &edges, ids)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn detect_terminates_within_linear_rounds(
            seed in any::<u64>(),
            n in 2usize..=50,
            p in 0.05f64..0.6,
            min_size in 1usize..5,
            dup_cp in 0.5f64..3.0,
        ) {
            let mut ids = IdAllocator::new();
            let mut g = random_graph(seed, n, p, &mut ids);
            let splitter = BetweennessSplitter::new()
                .with_min_cluster_node_size(min_size)
                .with_max_cluster_node_size(50)
                .with_min_cp_to_duplicate_edge(dup_cp);

            for component in crate::community::partition(&g, g.all_nodes()) {
                let edges = g.edges_within(&component).len();
                let detection = splitter.detect(&mut g, component.clone(), &mut ids);
                prop_assert!(detection.rounds <= 2 * edges + 1);

                // every original node lands in exactly one community; extra nodes are ghosts
                let ghosts: NodeSet = detection.duplications.iter().map(|d| d.ghost).collect();
                let mut seen = NodeSet::new();
                for c in &detection.communities {
                    prop_assert!(g.subgraph(c).is_connected());
                    for &ix in c {
                        prop_assert!(seen.insert(ix));
                    }
                }
                let originals: NodeSet = seen.difference(&ghosts).copied().collect();
                prop_assert_eq!(originals, component);
            }
        }
    }
}
