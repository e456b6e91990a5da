//! Event evaluation against ground-truth topic labels.
//!
//! Only documents carrying a [`Document::topic`](crate::corpus::Document)
//! label are scored. Labelled documents that no event claimed are counted
//! but excluded from purity and NMI, since assignment is allowed to leave
//! documents out.
//!
//! | Metric | Range | Best | Properties |
//! |--------|-------|------|------------|
//! | purity | [0, 1] | 1 | Simple, biased toward many small events |
//! | nmi | [0, 1] | 1 | Normalized, comparable across corpora |
//!
//! # References
//!
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use crate::corpus::Corpus;
use crate::event::Event;
use std::collections::{BTreeMap, HashMap};

/// Scores of one event detection run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventScores {
    /// Fraction of assigned documents matching their event's majority topic.
    pub purity: f64,
    /// Normalized mutual information between events and topics.
    pub nmi: f64,
    /// Labelled documents assigned to some event.
    pub assigned: usize,
    /// Labelled documents assigned to no event.
    pub unassigned: usize,
}

/// Score events against the topic labels of the corpus.
pub fn evaluate(events: &[Event], corpus: &Corpus) -> EventScores {
    let mut topics: BTreeMap<&str, usize> = BTreeMap::new();
    let mut pred = Vec::new();
    let mut truth = Vec::new();

    for (i, event) in events.iter().enumerate() {
        for id in event.docs.keys() {
            let Some(topic) = corpus.document(id).and_then(|d| d.topic.as_deref()) else {
                continue;
            };
            let next = topics.len();
            pred.push(i);
            truth.push(*topics.entry(topic).or_insert(next));
        }
    }

    let labelled = corpus.docs().values().filter(|d| d.topic.is_some()).count();
    EventScores {
        purity: purity(&pred, &truth),
        nmi: nmi(&pred, &truth),
        assigned: pred.len(),
        unassigned: labelled.saturating_sub(pred.len()),
    }
}

/// Purity: fraction of items in the majority class of their cluster.
///
/// ```text
/// purity = (1/n) Σ_k max_c |k ∩ c|
/// ```
pub fn purity(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let joint = build_contingency_table(pred, truth);
    let mut cluster_maxes: HashMap<usize, usize> = HashMap::new();
    for (&(p, _), &count) in &joint {
        let current_max = cluster_maxes.entry(p).or_insert(0);
        *current_max = (*current_max).max(count);
    }

    let correct: usize = cluster_maxes.values().sum();
    correct as f64 / pred.len() as f64
}

/// Normalized Mutual Information between two labelings.
///
/// ```text
/// NMI(U, V) = 2 · I(U; V) / (H(U) + H(V))
/// ```
///
/// Two constant labelings score 1.
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n = pred.len() as f64;
    let joint = build_contingency_table(pred, truth);
    let p_pred = counts(pred);
    let p_truth = counts(truth);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n;
        let p_p = p_pred.get(&p).copied().unwrap_or(0) as f64 / n;
        let p_t = p_truth.get(&t).copied().unwrap_or(0) as f64 / n;
        if p_p > 0.0 && p_t > 0.0 {
            mi += p_joint * (p_joint / (p_p * p_t)).ln();
        }
    }

    let denom = entropy(&p_pred, n) + entropy(&p_truth, n);
    if denom > 0.0 {
        2.0 * mi / denom
    } else {
        1.0
    }
}

fn build_contingency_table(pred: &[usize], truth: &[usize]) -> HashMap<(usize, usize), usize> {
    let mut joint = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth) {
        *joint.entry((p, t)).or_insert(0) += 1;
    }
    joint
}

fn counts(labels: &[usize]) -> HashMap<usize, usize> {
    let mut out = HashMap::new();
    for &l in labels {
        *out.entry(l).or_insert(0) += 1;
    }
    out
}

fn entropy(counts: &HashMap<usize, usize>, n: f64) -> f64 {
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;
    use crate::graph::{EventId, KeywordGraph};
    use std::sync::Arc;

    #[test]
    fn test_nmi_permuted() {
        let pred = [1, 1, 0, 0, 2, 2];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&pred, &truth) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_purity_overclustering() {
        // each item its own cluster is trivially pure
        let pred = [0, 1, 2, 3];
        let truth = [0, 0, 1, 1];
        assert!((purity(&pred, &truth) - 1.0).abs() < 1e-9);
        assert!(nmi(&pred, &truth) < 1.0);
    }

    #[test]
    fn test_empty_labelings() {
        assert_eq!(purity(&[], &[]), 0.0);
        assert_eq!(nmi(&[0], &[0, 1]), 0.0);
    }

    #[test]
    fn test_evaluate_counts_unassigned_labelled_documents() {
        let corpus = Corpus::from_documents([
            Document::new("1").with_topic("storm").with_keyword("rain", 1.0),
            Document::new("2").with_topic("storm").with_keyword("rain", 1.0),
            Document::new("3").with_topic("vote").with_keyword("poll", 1.0),
            Document::new("4").with_keyword("misc", 1.0),
        ]);
        let event = Event {
            id: EventId(1),
            key_graph: KeywordGraph::new(),
            docs: ["1", "2", "4"]
                .iter()
                .map(|&id| (id.to_string(), Arc::clone(corpus.document(id).unwrap())))
                .collect(),
            similarities: BTreeMap::new(),
        };

        let scores = evaluate(&[event], &corpus);
        assert_eq!(scores.assigned, 2);
        assert_eq!(scores.unassigned, 1);
        assert!((scores.purity - 1.0).abs() < 1e-9);
        assert!((scores.nmi - 1.0).abs() < 1e-9);
    }
}
