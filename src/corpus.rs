//! Documents, their keywords, and corpus-level document frequencies.
//!
//! Tokenization and keyword extraction happen upstream. A `Corpus` arrives
//! with every document's keyword map filled in; the DF map is either supplied
//! by the loader ([`Corpus::with_df`]) or recomputed ([`Corpus::update_df`]).
//!
//! ## Weighting
//!
//! ```text
//! idf(t)      = log2(N / (df(t) + 1))
//! tfidf(t, d) = tf(t, d) × idf(t)
//! ```
//!
//! `idf` can be negative for terms present in nearly every document; that is
//! kept, only zero weights short-circuit.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Document identifier.
pub type DocId = String;

/// Term to document-frequency map.
pub type DocumentFrequencies = BTreeMap<String, usize>;

/// Inverse document frequency, `log2(n_docs / (df + 1))`.
///
/// Returns 0 for an empty corpus.
pub fn idf(df: f64, n_docs: usize) -> f64 {
    if n_docs == 0 {
        return 0.0;
    }
    (n_docs as f64 / (df + 1.0)).log2()
}

/// TF-IDF weight. Zero when either factor is zero.
pub fn tfidf(tf: f64, idf: f64) -> f64 {
    if tf == 0.0 || idf == 0.0 {
        return 0.0;
    }
    tf * idf
}

/// A keyword occurrence inside one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    /// Canonical form, used as the key everywhere.
    pub base_form: String,
    /// Surface form as it appeared in the text.
    pub word: String,
    /// Term frequency within the document (may be boosted upstream).
    pub tf: f64,
}

impl Keyword {
    /// Create a keyword.
    pub fn new(base_form: impl Into<String>, word: impl Into<String>, tf: f64) -> Self {
        Self {
            base_form: base_form.into(),
            word: word.into(),
            tf,
        }
    }
}

/// A document with its keyword vector.
///
/// Vector norms are computed on first use and cached. The cached TF-IDF norm
/// belongs to the DF map of the owning [`Corpus`], which clears it whenever
/// that map changes.
#[derive(Debug, Clone)]
pub struct Document {
    /// Document identifier.
    pub id: DocId,
    /// Display title.
    pub title: String,
    /// Ground-truth topic label, when known.
    pub topic: Option<String>,
    keywords: BTreeMap<String, Keyword>,
    tf_norm: OnceLock<f64>,
    tfidf_norm: OnceLock<f64>,
}

impl Document {
    /// Create an empty document.
    pub fn new(id: impl Into<DocId>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            topic: None,
            keywords: BTreeMap::new(),
            tf_norm: OnceLock::new(),
            tfidf_norm: OnceLock::new(),
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the ground-truth topic label.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Add a keyword whose surface form equals its base form.
    pub fn with_keyword(mut self, base_form: &str, tf: f64) -> Self {
        self.insert_keyword(Keyword::new(base_form, base_form, tf));
        self
    }

    /// Add a keyword, accumulating `tf` if the base form is already present.
    pub fn insert_keyword(&mut self, keyword: Keyword) {
        match self.keywords.get_mut(&keyword.base_form) {
            Some(existing) => existing.tf += keyword.tf,
            None => {
                let _ = self.keywords.insert(keyword.base_form.clone(), keyword);
            }
        }
        self.tf_norm = OnceLock::new();
        self.tfidf_norm = OnceLock::new();
    }

    fn clear_tfidf_norm(&mut self) {
        self.tfidf_norm = OnceLock::new();
    }

    /// Keywords keyed by base form.
    pub fn keywords(&self) -> &BTreeMap<String, Keyword> {
        &self.keywords
    }

    /// Look up a keyword by base form.
    pub fn keyword(&self, base_form: &str) -> Option<&Keyword> {
        self.keywords.get(base_form)
    }

    /// Whether the term matches a keyword's base form or surface form, or a title word.
    pub fn contains_keyword(&self, term: &str) -> bool {
        self.keywords.contains_key(term)
            || self.keywords.values().any(|k| k.word == term)
            || self.title.split_whitespace().any(|w| w == term)
    }

    /// Euclidean norm of the raw TF vector.
    pub fn tf_norm(&self) -> f64 {
        *self.tf_norm.get_or_init(|| {
            self.keywords
                .values()
                .map(|k| k.tf * k.tf)
                .sum::<f64>()
                .sqrt()
        })
    }

    /// Euclidean norm of the TF-IDF vector over all keywords.
    ///
    /// Terms missing from `df` contribute nothing.
    pub fn tfidf_norm(&self, df: &DocumentFrequencies, n_docs: usize) -> f64 {
        *self.tfidf_norm.get_or_init(|| {
            self.tfidf_norm_where(df, n_docs, |_| true)
        })
    }

    /// Euclidean norm of the TF-IDF vector restricted to terms accepted by `within`.
    pub fn tfidf_norm_where<F>(&self, df: &DocumentFrequencies, n_docs: usize, within: F) -> f64
    where
        F: Fn(&str) -> bool,
    {
        self.keywords
            .values()
            .filter(|k| within(&k.base_form))
            .filter_map(|k| {
                let d = *df.get(&k.base_form)?;
                let w = tfidf(k.tf, idf(d as f64, n_docs));
                Some(w * w)
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Cosine similarity of raw TF vectors. Zero if either norm is zero.
    pub fn tf_cosine(&self, other: &Document) -> f64 {
        let (n1, n2) = (self.tf_norm(), other.tf_norm());
        if n1 == 0.0 || n2 == 0.0 {
            return 0.0;
        }
        let dot: f64 = self
            .keywords
            .values()
            .filter_map(|k| other.keywords.get(&k.base_form).map(|o| k.tf * o.tf))
            .sum();
        dot / n1 / n2
    }

    /// Cosine similarity of TF-IDF vectors. Zero if either norm is zero.
    pub fn tfidf_cosine(&self, other: &Document, df: &DocumentFrequencies, n_docs: usize) -> f64 {
        let (n1, n2) = (self.tfidf_norm(df, n_docs), other.tfidf_norm(df, n_docs));
        if n1 == 0.0 || n2 == 0.0 {
            return 0.0;
        }
        let mut dot = 0.0;
        for k in self.keywords.values() {
            let (Some(o), Some(&d)) = (other.keywords.get(&k.base_form), df.get(&k.base_form))
            else {
                continue;
            };
            let w = idf(d as f64, n_docs);
            dot += tfidf(k.tf, w) * tfidf(o.tf, w);
        }
        dot / n1 / n2
    }
}

/// One snapshot of documents plus corpus-level document frequencies.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: BTreeMap<DocId, Arc<Document>>,
    df: DocumentFrequencies,
}

impl Corpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from documents and compute its DF map.
    pub fn from_documents<I>(docs: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut corpus = Self::new();
        for doc in docs {
            corpus.insert(doc);
        }
        corpus.update_df();
        corpus
    }

    /// Replace the DF map with one supplied by the loader.
    pub fn with_df(mut self, df: DocumentFrequencies) -> Self {
        self.df = df;
        self.clear_tfidf_norms();
        self
    }

    /// Insert or replace a document. The DF map is not touched.
    pub fn insert(&mut self, doc: Document) {
        let _ = self.docs.insert(doc.id.clone(), Arc::new(doc));
    }

    /// Recompute document frequencies from the current documents.
    pub fn update_df(&mut self) {
        self.df.clear();
        for doc in self.docs.values() {
            for base_form in doc.keywords.keys() {
                *self.df.entry(base_form.clone()).or_insert(0) += 1;
            }
        }
        self.clear_tfidf_norms();
    }

    /// Forget TF-IDF norms measured against a previous DF map.
    ///
    /// Documents shared with another corpus or event are copied first, so
    /// their other owners keep the norm of their own snapshot.
    fn clear_tfidf_norms(&mut self) {
        for doc in self.docs.values_mut() {
            if doc.tfidf_norm.get().is_some() {
                Arc::make_mut(doc).clear_tfidf_norm();
            }
        }
    }

    /// Add every document of `other` whose id is not present yet, then recompute DF.
    pub fn merge(&mut self, other: &Corpus) {
        for (id, doc) in &other.docs {
            if !self.docs.contains_key(id) {
                let _ = self.docs.insert(id.clone(), Arc::clone(doc));
            }
        }
        self.update_df();
    }

    /// Drop documents with fewer than `min_keywords` keywords, then recompute DF.
    pub fn retain_min_keywords(&mut self, min_keywords: usize) {
        self.docs.retain(|_, doc| doc.keywords.len() >= min_keywords);
        self.update_df();
    }

    /// Documents keyed by id.
    pub fn docs(&self) -> &BTreeMap<DocId, Arc<Document>> {
        &self.docs
    }

    /// Look up a document.
    pub fn document(&self, id: &str) -> Option<&Arc<Document>> {
        self.docs.get(id)
    }

    /// Corpus-level document frequencies.
    pub fn df_map(&self) -> &DocumentFrequencies {
        &self.df
    }

    /// Document frequency of a term, if known.
    pub fn df(&self, base_form: &str) -> Option<usize> {
        self.df.get(base_form).copied()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the corpus has no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
