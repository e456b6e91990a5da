//! Community detection on keyword graphs.
//!
//! A keyword graph is first cut into connected components. Each component is
//! routed by size: too small is noise, too large is shrunk by dropping its
//! weakest edges, and anything in between is split by edge betweenness.
//!
//! ## Betweenness splitting
//!
//! A variant of Girvan–Newman ([Girvan & Newman 2002](https://arxiv.org/abs/cond-mat/0112110)):
//! the edge lying on the most shortest paths is a bridge between two dense
//! regions, so removing it tends to separate topics. Unlike the modularity
//! family there is no global objective; a statistical threshold on the
//! highest betweenness decides whether a component is one topic or several:
//!
//! ```text
//! split  ⇔  n > minClusterNodeSize  ∧  df(e*) > 0
//!           ∧  betweenness(e*) > 4.2 · log2(min(n(n−1)/2, cap(cap−1)/2)) + 1
//! ```
//!
//! ## Duplication
//!
//! When the removed edge carries a strong conditional probability
//! (`cp > minCpToDuplicateEdge`), the implied endpoint is cloned as a ghost
//! node onto the other side of the cut. Communities therefore may share
//! keywords through ghosts; every ghost is reported as a [`Duplication`].
//!
//! ## Usage
//!
//! ```rust
//! use keygraph::community::CommunityDetector;
//! use keygraph::graph::{GraphBuilder, IdAllocator};
//! use keygraph::{Config, Corpus, Document};
//!
//! let corpus = Corpus::from_documents([
//!     Document::new("1").with_keyword("storm", 1.0).with_keyword("flood", 1.0),
//!     Document::new("2").with_keyword("storm", 1.0).with_keyword("flood", 1.0),
//! ]);
//! let config = Config::new().with_min_edge_df(2).with_min_cluster_node_size(2);
//! let mut ids = IdAllocator::new();
//! let mut graph = GraphBuilder::from_config(&config).build(&corpus, &mut ids);
//!
//! let detection = CommunityDetector::from_config(&config)?.detect(&mut graph, &mut ids);
//! assert_eq!(detection.communities.len(), 1);
//! # Ok::<(), keygraph::Error>(())
//! ```

mod betweenness;
mod detector;
mod partition;
mod traits;

pub use betweenness::{edge_betweenness, BetweennessSplitter};
pub use detector::{remove_weakest_edges, CommunityDetector};
pub use partition::partition;
pub use traits::{CommunityDetection, Detection, Duplication};
