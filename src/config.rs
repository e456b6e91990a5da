//! Configuration scalars consumed by the event detection pipeline.
//!
//! Loading is the caller's job: `Config` only derives serde so that whatever
//! loader is in use can materialize it. Every scalar the pipeline reads is
//! required, so a missing one fails deserialization instead of silently
//! falling back to a default.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Community detection algorithms known to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunityDetectAlg {
    /// Girvan-Newman style splitting on edge betweenness.
    Betweenness,
}

impl FromStr for CommunityDetectAlg {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "betweenness" => Ok(Self::Betweenness),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for CommunityDetectAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Betweenness => write!(f, "betweenness"),
        }
    }
}

/// Scalars for graph construction, community detection, and document assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Minimum number of documents two keywords must share to keep their edge.
    #[serde(rename = "minEdgeDF")]
    pub min_edge_df: usize,
    /// Minimum `df / (df1 + df2 - df)` for an edge to survive filtering.
    pub min_edge_correlation: f64,
    /// Components smaller than this are discarded; splitting stops at this size.
    pub min_cluster_node_size: usize,
    /// Components larger than this are shrunk before betweenness analysis.
    pub max_cluster_node_size: usize,
    /// Conditional probability above which a cut edge is duplicated into the other half.
    pub min_cp_to_duplicate_edge: f64,
    /// Events with fewer assigned documents are dropped.
    pub min_topic_size: usize,
    /// Name of the community detection algorithm. Only `"betweenness"` is implemented.
    pub community_detect_alg: String,
    /// Similarity floor for document assignment.
    ///
    /// Read but not enforced: assignment is an unconditional arg-max.
    #[serde(rename = "minSimDoc2KeyGraph")]
    pub min_sim_doc_to_key_graph: f64,
    /// Prune key-graph keywords absent from every assigned document.
    #[serde(default)]
    pub refine_key_graphs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_edge_df: 3,
            min_edge_correlation: 0.15,
            min_cluster_node_size: 3,
            max_cluster_node_size: 800,
            min_cp_to_duplicate_edge: 1.7,
            min_topic_size: 5,
            community_detect_alg: "betweenness".to_string(),
            min_sim_doc_to_key_graph: 0.25,
            refine_key_graphs: false,
        }
    }
}

impl Config {
    /// Create a configuration with the default scalars.
    pub fn new() -> Self {
        Self::default()
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

    /// Set the minimum community size.
    pub fn with_min_cluster_node_size(mut self, size: usize) -> Self {
        self.min_cluster_node_size = size;
        self
    }

    /// Set the maximum size a component may have before it is shrunk.
    pub fn with_max_cluster_node_size(mut self, size: usize) -> Self {
        self.max_cluster_node_size = size;
        self
    }

    /// Set the duplication threshold for cut edges.
    pub fn with_min_cp_to_duplicate_edge(mut self, cp: f64) -> Self {
        self.min_cp_to_duplicate_edge = cp;
        self
    }

    /// Set the minimum number of documents per emitted event.
    pub fn with_min_topic_size(mut self, size: usize) -> Self {
        self.min_topic_size = size;
        self
    }

    /// Set the community detection algorithm by name.
    pub fn with_community_detect_alg(mut self, alg: impl Into<String>) -> Self {
        self.community_detect_alg = alg.into();
        self
    }

    /// Set the (inert) document-to-key-graph similarity floor.
    pub fn with_min_sim_doc_to_key_graph(mut self, sim: f64) -> Self {
        self.min_sim_doc_to_key_graph = sim;
        self
    }

    /// Enable or disable key-graph refinement after assignment.
    pub fn with_refine_key_graphs(mut self, refine: bool) -> Self {
        self.refine_key_graphs = refine;
        self
    }

    /// Check every scalar and resolve the community detection algorithm.
    pub fn validate(&self) -> Result<CommunityDetectAlg> {
        if self.max_cluster_node_size == 0 {
            return Err(Error::InvalidParameter {
                name: "maxClusterNodeSize",
                message: "must be at least 1",
            });
        }
        if self.min_cluster_node_size > self.max_cluster_node_size {
            return Err(Error::InvalidParameter {
                name: "minClusterNodeSize",
                message: "must not exceed maxClusterNodeSize",
            });
        }
        if !self.min_edge_correlation.is_finite() {
            return Err(Error::InvalidParameter {
                name: "minEdgeCorrelation",
                message: "must be finite",
            });
        }
        if self.min_cp_to_duplicate_edge.is_nan() {
            return Err(Error::InvalidParameter {
                name: "minCpToDuplicateEdge",
                message: "must not be NaN",
            });
        }
        if self.min_sim_doc_to_key_graph.is_nan() {
            return Err(Error::InvalidParameter {
                name: "minSimDoc2KeyGraph",
                message: "must not be NaN",
            });
        }
        self.community_detect_alg.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        let alg = Config::default().validate().unwrap();
        assert_eq!(alg, CommunityDetectAlg::Betweenness);
    }

    #[test]
    fn test_algorithm_name_is_case_insensitive() {
        let config = Config::new().with_community_detect_alg("Betweenness");
        assert_eq!(config.validate().unwrap(), CommunityDetectAlg::Betweenness);
    }

    #[test]
    fn test_unsupported_algorithm_is_fatal() {
        let config = Config::new().with_community_detect_alg("louvain");
        assert_eq!(
            config.validate(),
            Err(Error::UnsupportedAlgorithm("louvain".to_string()))
        );
    }

    #[test]
    fn test_min_above_max_is_rejected() {
        let config = Config::new()
            .with_min_cluster_node_size(10)
            .with_max_cluster_node_size(5);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter { name: "minClusterNodeSize", .. })
        ));
    }

    #[test]
    fn test_deserialize_uses_original_names() {
        let json = r#"{
            "minEdgeDF": 2,
            "minEdgeCorrelation": 0.1,
            "minClusterNodeSize": 2,
            "maxClusterNodeSize": 100,
            "minCpToDuplicateEdge": 0.9,
            "minTopicSize": 2,
            "communityDetectAlg": "Betweenness",
            "minSimDoc2KeyGraph": 0.3
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.min_edge_df, 2);
        assert_eq!(config.max_cluster_node_size, 100);
        assert!(!config.refine_key_graphs);
        assert!((config.min_sim_doc_to_key_graph - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_missing_scalar_fails_to_deserialize() {
        let json = r#"{
            "minEdgeDF": 2,
            "minEdgeCorrelation": 0.1,
            "minClusterNodeSize": 2,
            "minCpToDuplicateEdge": 0.9,
            "minTopicSize": 2,
            "communityDetectAlg": "betweenness",
            "minSimDoc2KeyGraph": 0.3
        }"#;
        let err = serde_json::from_str::<Config>(json).unwrap_err();
        assert!(err.to_string().contains("maxClusterNodeSize"));
    }
}
