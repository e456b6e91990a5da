//! # keygraph
//!
//! Event detection on keyword co-occurrence graphs.
//!
//! A corpus snapshot is turned into topic clusters ("events") in four steps:
//!
//! 1. [`GraphBuilder`] links keywords that co-occur in enough documents.
//! 2. [`community::partition`] cuts the graph into connected components.
//! 3. [`CommunityDetector`] discards tiny components, shrinks huge ones, and
//!    splits the rest by edge betweenness ([`BetweennessSplitter`]).
//! 4. [`DocumentAssigner`] gives every document to the single community whose
//!    TF-IDF pseudo-document it matches best.
//!
//! Tokenization, DF bookkeeping, and configuration loading happen upstream;
//! this crate consumes a populated [`Corpus`] and a [`Config`].
//!
//! ```rust
//! use keygraph::{detect_events, Config, Corpus, Document};
//!
//! let corpus = Corpus::from_documents((0..3).map(|i| {
//!     Document::new(format!("{i}"))
//!         .with_keyword("storm", 1.0)
//!         .with_keyword("flood", 1.0)
//! }));
//! let config = Config::new()
//!     .with_min_edge_df(2)
//!     .with_min_cluster_node_size(2)
//!     .with_min_topic_size(2);
//!
//! let events = detect_events(&corpus, &config)?;
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].len(), 3);
//! # Ok::<(), keygraph::Error>(())
//! ```

pub mod community;
pub mod config;
pub mod corpus;
/// Error types used across `keygraph`.
pub mod error;
pub mod event;
pub mod graph;
pub mod metrics;


pub use community::{BetweennessSplitter, CommunityDetection, CommunityDetector, Detection};
pub use config::{CommunityDetectAlg, Config};
pub use corpus::{Corpus, Document, Keyword};
pub use error::{Error, Result};
pub use event::{detect_events, DocumentAssigner, Event, EventDetector};
pub use graph::{GraphBuilder, IdAllocator, KeywordGraph};
pub use metrics::{evaluate, EventScores};
