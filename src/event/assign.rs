//! Document-to-community assignment by TF-IDF cosine similarity.
//!
//! Each community becomes a pseudo-document: a keyword's pseudo term
//! frequency is the mean strength `max(cp1, cp2)` of its incident edges.
//! Documents are compared against every community that shares a keyword with
//! them, and each document goes to its arg-max community only:
//!
//! ```text
//! w_c(t)   = tfidf(mean_e max(cp1, cp2), idf(t))
//! w_d(t)   = tfidf(tf(t, d), idf(t))
//! sim(c,d) = Σ_t w_c(t)·w_d(t) / (‖w_c‖ · ‖w_d|_c‖)
//! ```
//!
//! `‖w_d|_c‖` is the document norm restricted to the community's vocabulary,
//! so a long document is not penalized for unrelated keywords.

use super::Event;
use crate::corpus::{idf, tfidf, Corpus, DocId, Document};
use crate::graph::{IdAllocator, KeywordGraph};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// TF-IDF pseudo-document of one community.
#[derive(Debug, Clone, Default)]
pub struct CommunityVector {
    /// Base form to `(idf, weight)`. Terms without a DF entry are absent.
    terms: BTreeMap<String, (f64, f64)>,
    norm: f64,
}

impl CommunityVector {
    /// Build the pseudo-document of a key graph against a corpus DF map.
    pub fn from_graph(graph: &KeywordGraph, corpus: &Corpus) -> Self {
        let mut strength: BTreeMap<&str, f64> = BTreeMap::new();
        for ix in graph.node_indices() {
            let Some(node) = graph.node(ix) else { continue };
            let incident = graph.incident(ix);
            let mean = if incident.is_empty() {
                0.0
            } else {
                incident
                    .iter()
                    .filter_map(|&(e, _)| graph.edge(e))
                    .map(|edge| edge.strength())
                    .sum::<f64>()
                    / incident.len() as f64
            };
            let w = strength.entry(node.keyword.base_form.as_str()).or_insert(0.0);
            *w = w.max(mean);
        }

        let n_docs = corpus.len();
        let terms: BTreeMap<String, (f64, f64)> = strength
            .into_iter()
            .filter_map(|(term, tf)| {
                let df = corpus.df(term)?;
                let w = idf(df as f64, n_docs);
                Some((term.to_string(), (w, tfidf(tf, w))))
            })
            .collect();
        let norm = terms.values().map(|&(_, w)| w * w).sum::<f64>().sqrt();
        Self { terms, norm }
    }

    /// Number of weighted terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no term carries a DF entry.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Euclidean norm of the community vector.
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// TF-IDF weight of a term, if the community has it and the corpus knows it.
    pub fn weight(&self, term: &str) -> Option<f64> {
        self.terms.get(term).map(|&(_, w)| w)
    }

    /// Cosine similarity to a document. Zero if either norm is zero.
    ///
    /// The document norm restricted to this vocabulary is not cached; it is
    /// recomputed on every call.
    pub fn cosine(&self, doc: &Document, corpus: &Corpus) -> f64 {
        if self.norm == 0.0 {
            return 0.0;
        }
        let doc_norm =
            doc.tfidf_norm_where(corpus.df_map(), corpus.len(), |t| self.terms.contains_key(t));
        if doc_norm == 0.0 {
            return 0.0;
        }
        let dot: f64 = self
            .terms
            .iter()
            .filter_map(|(term, &(w, weight))| {
                doc.keyword(term).map(|k| weight * tfidf(k.tf, w))
            })
            .sum();
        dot / self.norm / doc_norm
    }
}

/// Assigns each document to at most one community.
#[derive(Debug, Clone)]
pub struct DocumentAssigner {
    min_topic_size: usize,
}

impl DocumentAssigner {
    /// Create an assigner that drops events with fewer than `min_topic_size` documents.
    pub fn new(min_topic_size: usize) -> Self {
        Self { min_topic_size }
    }

    /// Assign corpus documents to key graphs and emit events.
    ///
    /// Events come out in key-graph order. A document is compared only with
    /// communities whose keywords reference it, and lands in the one with
    /// the highest similarity; on equal similarity the earlier community
    /// keeps it. A similarity of 0 still beats "unassigned".
    pub fn assign(
        &self,
        key_graphs: Vec<KeywordGraph>,
        corpus: &Corpus,
        ids: &mut IdAllocator,
    ) -> Vec<Event> {
        let mut best: BTreeMap<&str, (Option<usize>, f64)> = BTreeMap::new();

        for (i, graph) in key_graphs.iter().enumerate() {
            let vector = CommunityVector::from_graph(graph, corpus);
            let candidates: BTreeSet<&DocId> = graph
                .node_indices()
                .filter_map(|ix| graph.node(ix))
                .flat_map(|node| node.keyword.documents.iter())
                .collect();
            for id in candidates {
                let Some(doc) = corpus.document(id) else { continue };
                let sim = vector.cosine(doc, corpus);
                let entry = best.entry(doc.id.as_str()).or_insert((None, -1.0));
                if sim > entry.1 {
                    *entry = (Some(i), sim);
                }
            }
        }

        let mut assigned: Vec<BTreeMap<DocId, f64>> = vec![BTreeMap::new(); key_graphs.len()];
        for (id, (community, sim)) in best {
            if let Some(i) = community {
                let _ = assigned[i].insert(id.to_string(), sim);
            }
        }

        let candidates = key_graphs.len();
        let mut events = Vec::new();
        for (key_graph, similarities) in key_graphs.into_iter().zip(assigned) {
            if similarities.len() < self.min_topic_size {
                continue;
            }
            let docs: BTreeMap<DocId, Arc<Document>> = similarities
                .keys()
                .filter_map(|id| Some((id.clone(), Arc::clone(corpus.document(id)?))))
                .collect();
            events.push(Event {
                id: ids.next_event_id(),
                key_graph,
                docs,
                similarities,
            });
        }

        debug!(
            communities = candidates,
            events = events.len(),
            min_topic_size = self.min_topic_size,
            "assigned documents"
        );
        events
    }
}
