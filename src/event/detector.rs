//! The end-to-end pipeline: corpus in, events out.

use super::{DocumentAssigner, Event};
use crate::community::CommunityDetector;
use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::Result;
use crate::graph::{GraphBuilder, IdAllocator, KeywordGraph};
use tracing::{debug, info};

/// Runs graph construction, community detection, and document assignment
/// over one corpus snapshot.
///
/// ```rust
/// use keygraph::{Config, Corpus, Document, EventDetector};
///
/// let docs = (0..4).map(|i| {
///     Document::new(format!("{i}"))
///         .with_keyword("storm", 1.0)
///         .with_keyword("flood", 1.0)
///         .with_keyword("coast", 1.0)
/// });
/// let config = Config::new().with_min_edge_df(2).with_min_topic_size(2);
/// let events = EventDetector::new(config)?.detect_events(&Corpus::from_documents(docs));
/// assert_eq!(events.len(), 1);
/// # Ok::<(), keygraph::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct EventDetector {
    config: Config,
    builder: GraphBuilder,
    detector: CommunityDetector,
    assigner: DocumentAssigner,
}

impl EventDetector {
    /// Validate the configuration and set up every stage.
    ///
    /// # Errors
    ///
    /// Returns the validation error for an unsupported algorithm or an
    /// invalid scalar. No partial pipeline is built.
    pub fn new(config: Config) -> Result<Self> {
        let detector = CommunityDetector::from_config(&config)?;
        debug!(
            min_sim_doc_to_key_graph = config.min_sim_doc_to_key_graph,
            "similarity floor is not enforced, assignment is arg-max"
        );
        Ok(Self {
            builder: GraphBuilder::from_config(&config),
            assigner: DocumentAssigner::new(config.min_topic_size),
            detector,
            config,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Detect events with a fresh id allocator.
    pub fn detect_events(&self, corpus: &Corpus) -> Vec<Event> {
        let mut ids = IdAllocator::new();
        self.detect_events_with(corpus, &mut ids)
    }

    /// Detect events, drawing node and event ids from `ids`.
    pub fn detect_events_with(&self, corpus: &Corpus, ids: &mut IdAllocator) -> Vec<Event> {
        if corpus.is_empty() {
            debug!("empty corpus, no events");
            return Vec::new();
        }

        let mut graph = self.builder.build(corpus, ids);
        let detection = self.detector.detect(&mut graph, ids);
        let key_graphs: Vec<KeywordGraph> = detection
            .communities
            .iter()
            .map(|community| graph.subgraph(community))
            .collect();

        let mut events = self.assigner.assign(key_graphs, corpus, ids);
        if self.config.refine_key_graphs {
            let pruned: usize = events.iter_mut().map(Event::refine_key_graph).sum();
            debug!(pruned, "refined key graphs");
        }

        info!(
            documents = corpus.len(),
            communities = detection.communities.len(),
            duplicated = detection.duplications.len(),
            events = events.len(),
            "event detection finished"
        );
        events
    }
}

/// Validate `config` and run the whole pipeline on `corpus`.
///
/// # Errors
///
/// Fails only on configuration errors; every well-formed corpus, empty ones
/// included, yields `Ok`.
pub fn detect_events(corpus: &Corpus, config: &Config) -> Result<Vec<Event>> {
    Ok(EventDetector::new(config.clone())?.detect_events(corpus))
}
