//! TF-IDF corpus index.
//!
//! [`CorpusIndex`] keeps per-document term counts plus the global document
//! frequency of every term. IDF weights are never cached: every vector is
//! computed against the statistics current at the time of the call, so an
//! index built incrementally and one rebuilt from scratch over the same
//! documents are equal and produce identical vectors.

use std::collections::BTreeMap;

use crate::document::Document;
use crate::error::{IntakeError, Result};
use crate::normalize::normalize;

/// A sparse TF-IDF vector keyed by normalized term.
pub type TermVector = BTreeMap<String, f64>;

/// The set of live documents plus global term statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorpusIndex {
    documents: BTreeMap<String, Document>,
    document_frequency: BTreeMap<String, usize>,
}

impl CorpusIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from scratch over `(id, text)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateId`] if an id appears twice. No partial
    /// index is returned.
    pub fn rebuild<I, S, T>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut index = Self::new();
        for (id, text) in documents {
            index.insert(id, text)?;
        }
        Ok(index)
    }

    /// Index a new document.
    ///
    /// Increments the document frequency of each distinct term once. Cost is
    /// proportional to the new document's length.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::DuplicateId`] if `id` is already indexed; the
    /// index is left unchanged.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) -> Result<()> {
        let id = id.into();
        if self.documents.contains_key(&id) {
            return Err(IntakeError::DuplicateId(id));
        }

        let document = Document::new(id.clone(), text);
        for term in document.token_counts().keys() {
            *self.document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
        self.documents.insert(id, document);
        Ok(())
    }

    /// Remove a document and return it.
    ///
    /// Terms whose document frequency drops to zero are forgotten entirely.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `id` is not indexed.
    pub fn remove(&mut self, id: &str) -> Result<Document> {
        let document =
            self.documents.remove(id).ok_or_else(|| IntakeError::NotFound(id.to_string()))?;

        for term in document.token_counts().keys() {
            if let Some(count) = self.document_frequency.get_mut(term) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.document_frequency.remove(term);
                }
            }
        }
        Ok(document)
    }

    /// Replace a document's text, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `id` is not indexed.
    pub fn update(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.remove(id)?;
        self.insert(id, text)
    }

    /// Returns the number of live documents.
    pub fn corpus_size(&self) -> usize {
        self.documents.len()
    }

    /// Returns `true` if no documents are indexed.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Returns `true` if `id` is indexed.
    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Returns a document by id.
    pub fn document(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    /// Iterate over documents in ascending id order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.values()
    }

    /// Returns the number of documents containing `term`.
    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }

    /// Returns the full term to document-frequency map.
    pub fn document_frequencies(&self) -> &BTreeMap<String, usize> {
        &self.document_frequency
    }

    /// Smoothed inverse document frequency of `term`.
    ///
    /// `ln((N + 1) / (df + 1)) + 1`. On an empty corpus this is `ln(2) + 1`
    /// for every term.
    pub fn idf(&self, term: &str) -> f64 {
        let corpus_size = self.corpus_size().max(1) as f64;
        let df = self.document_frequency(term) as f64;
        ((corpus_size + 1.0) / (df + 1.0)).ln() + 1.0
    }

    /// Returns the current TF-IDF vector of a document.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `id` is not indexed.
    pub fn vector(&self, id: &str) -> Result<TermVector> {
        let document = self.document(id).ok_or_else(|| IntakeError::NotFound(id.to_string()))?;
        Ok(self.weigh(document.token_counts(), document.token_len()))
    }

    /// Vectorize free text as a transient document against the current
    /// statistics. The index is not modified.
    pub fn query_vector(&self, text: &str) -> TermVector {
        let mut counts = BTreeMap::new();
        let tokens = normalize(text);
        let len = tokens.len();
        for token in tokens {
            *counts.entry(token).or_insert(0) += 1;
        }
        self.weigh(&counts, len)
    }

    /// L2 norm of a document's current TF-IDF vector.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NotFound`] if `id` is not indexed.
    pub fn vector_norm(&self, id: &str) -> Result<f64> {
        Ok(l2_norm(&self.vector(id)?))
    }

    fn weigh(&self, counts: &BTreeMap<String, usize>, len: usize) -> TermVector {
        if len == 0 {
            return TermVector::new();
        }
        let len = len as f64;
        counts
            .iter()
            .map(|(term, count)| (term.clone(), (*count as f64 / len) * self.idf(term)))
            .collect()
    }
}

/// Euclidean length of a sparse vector.
pub fn l2_norm(vector: &TermVector) -> f64 {
    vector.values().map(|w| w * w).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_updates_frequencies_once_per_document() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice invoice parser").unwrap();
        index.insert("b", "invoice router").unwrap();

        assert_eq!(index.corpus_size(), 2);
        assert_eq!(index.document_frequency("invoice"), 2);
        assert_eq!(index.document_frequency("parser"), 1);
        assert_eq!(index.document_frequency("missing"), 0);
    }

    #[test]
    fn duplicate_insert_leaves_index_unchanged() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice parser").unwrap();
        let before = index.clone();

        let err = index.insert("a", "completely different text").unwrap_err();

        assert_eq!(err, IntakeError::DuplicateId("a".into()));
        assert_eq!(index, before);
    }

    #[test]
    fn remove_forgets_terms_that_reach_zero() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice parser").unwrap();
        index.insert("b", "invoice router").unwrap();

        index.remove("a").unwrap();

        assert_eq!(index.corpus_size(), 1);
        assert_eq!(index.document_frequency("invoice"), 1);
        assert!(!index.document_frequencies().contains_key("parser"));
    }

    #[test]
    fn remove_unknown_id_is_not_found() {
        let mut index = CorpusIndex::new();
        assert_eq!(index.remove("ghost").unwrap_err(), IntakeError::NotFound("ghost".into()));
    }

    #[test]
    fn update_replaces_text() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice parser").unwrap();
        index.update("a", "payroll router").unwrap();

        assert_eq!(index.document_frequency("invoice"), 0);
        assert_eq!(index.document_frequency("payroll"), 1);
        assert_eq!(index.document("a").unwrap().raw_text(), "payroll router");
        assert!(index.update("ghost", "x").is_err());
    }

    #[test]
    fn idf_on_empty_corpus_is_ln2_plus_one() {
        let index = CorpusIndex::new();
        let expected = 2f64.ln() + 1.0;
        assert!((index.idf("anything") - expected).abs() < 1e-12);
    }

    #[test]
    fn idf_is_one_for_terms_in_every_document() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice").unwrap();
        index.insert("b", "invoice").unwrap();
        assert!((index.idf("invoice") - 1.0).abs() < 1e-12);
        assert!(index.idf("unseen") > index.idf("invoice"));
    }

    #[test]
    fn vector_uses_length_normalized_tf() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice invoice parser router").unwrap();
        let vector = index.vector("a").unwrap();
        // Single-document corpus: idf is 1 for every indexed term.
        assert!((vector["invoice"] - 0.5).abs() < 1e-12);
        assert!((vector["parser"] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn vector_reflects_later_inserts() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice parser").unwrap();
        let before = index.vector("a").unwrap();
        index.insert("b", "payroll router").unwrap();
        let after = index.vector("a").unwrap();
        assert!(after["invoice"] > before["invoice"]);
    }

    #[test]
    fn empty_document_has_zero_vector() {
        let mut index = CorpusIndex::new();
        index.insert("empty", "the and of").unwrap();
        assert!(index.vector("empty").unwrap().is_empty());
        assert_eq!(index.vector_norm("empty").unwrap(), 0.0);
    }

    #[test]
    fn query_vector_does_not_touch_statistics() {
        let mut index = CorpusIndex::new();
        index.insert("a", "invoice parser").unwrap();
        let before = index.clone();
        let query = index.query_vector("invoice router");
        assert!(query.contains_key("router"));
        assert_eq!(index, before);
    }

    #[test]
    fn rebuild_rejects_duplicate_ids() {
        let result = CorpusIndex::rebuild([("a", "one"), ("a", "two")]);
        assert_eq!(result.unwrap_err(), IntakeError::DuplicateId("a".into()));
    }
}
