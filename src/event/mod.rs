//! Events: accepted communities with the documents assigned to them.
//!
//! An [`Event`] owns its key graph, a copy of the community's nodes and
//! internal edges taken from the detection arena, so events outlive the
//! mutated working graph.

mod assign;
mod detector;

pub use assign::{CommunityVector, DocumentAssigner};
pub use detector::{detect_events, EventDetector};

use crate::corpus::{DocId, Document};
use crate::graph::{EventId, KeywordGraph, NodeIndex};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A topic cluster: keyword graph plus assigned documents.
#[derive(Debug, Clone)]
pub struct Event {
    /// Run-unique id.
    pub id: EventId,
    /// The community's keywords and the edges among them.
    pub key_graph: KeywordGraph,
    /// Documents assigned to this event.
    pub docs: BTreeMap<DocId, Arc<Document>>,
    /// Similarity of each assigned document to the key graph.
    pub similarities: BTreeMap<DocId, f64>,
}

impl Event {
    /// Number of assigned documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether no document is assigned.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Surface words of the key graph, sorted and deduplicated.
    pub fn keywords(&self) -> Vec<&str> {
        let mut words: Vec<&str> = self
            .key_graph
            .node_indices()
            .filter_map(|ix| self.key_graph.node(ix))
            .map(|node| node.keyword.word.as_str())
            .collect();
        words.sort_unstable();
        words.dedup();
        words
    }

    /// Similarity of an assigned document.
    pub fn similarity(&self, doc: &str) -> Option<f64> {
        self.similarities.get(doc).copied()
    }

    /// Drop key-graph keywords that no assigned document contains.
    ///
    /// Returns the number of nodes removed. Their edges go with them.
    pub fn refine_key_graph(&mut self) -> usize {
        let unused: Vec<NodeIndex> = self
            .key_graph
            .node_indices()
            .filter(|&ix| {
                self.key_graph.node(ix).is_some_and(|node| {
                    !self
                        .docs
                        .values()
                        .any(|doc| doc.contains_keyword(&node.keyword.base_form))
                })
            })
            .collect();
        for &ix in &unused {
            let _ = self.key_graph.remove_node(ix);
        }
        unused.len()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "EVENT {}", self.id)?;
        writeln!(f, "KEYWORDS:")?;
        writeln!(f, "{}", self.keywords().join(" "))?;
        writeln!(f, "DOCUMENTS:")?;
        for (id, doc) in &self.docs {
            match self.similarities.get(id) {
                Some(sim) => writeln!(f, "{id}\t{sim:.4}\t{}", doc.title)?,
                None => writeln!(f, "{id}\t-\t{}", doc.title)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::graph_from;
    use crate::graph::IdAllocator;

    fn event(words: &[&str], docs: Vec<Document>) -> Event {
        let mut ids = IdAllocator::new();
        let key_graph = graph_from(words, &[], &mut ids);
        let similarities = docs.iter().map(|d| (d.id.clone(), 0.5)).collect();
        Event {
            id: ids.next_event_id(),
            key_graph,
            docs: docs.into_iter().map(|d| (d.id.clone(), Arc::new(d))).collect(),
            similarities,
        }
    }

    #[test]
    fn test_refine_drops_unused_keywords() {
        let mut e = event(
            &["storm", "flood", "election"],
            vec![
                Document::new("1").with_keyword("storm", 1.0),
                Document::new("2")
                    .with_title("flood warning")
                    .with_keyword("rain", 1.0),
            ],
        );
        assert_eq!(e.refine_key_graph(), 1);
        assert_eq!(e.keywords(), vec!["flood", "storm"]);
        assert_eq!(e.refine_key_graph(), 0);
    }

    #[test]
    fn test_display_lists_keywords_and_documents() {
        let e = event(
            &["storm"],
            vec![Document::new("d1").with_title("Storm hits coast").with_keyword("storm", 2.0)],
        );
        let text = e.to_string();
        assert!(text.starts_with("EVENT e1\nKEYWORDS:\nstorm\nDOCUMENTS:\n"));
        assert!(text.contains("d1\t0.5000\tStorm hits coast"));
        assert_eq!(e.len(), 1);
        assert_eq!(e.similarity("d1"), Some(0.5));
        assert_eq!(e.similarity("d2"), None);
    }
}
