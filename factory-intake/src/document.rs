//! Data types for capability documents and similarity results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// One registered capability as held by the [`CorpusIndex`](crate::CorpusIndex).
///
/// Token statistics are derived from `raw_text` at construction and never
/// change; a text update replaces the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    id: String,
    raw_text: String,
    token_counts: BTreeMap<String, usize>,
    token_len: usize,
}

impl Document {
    /// Normalize `raw_text` and count its tokens.
    pub fn new(id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let tokens = normalize(&raw_text);
        let token_len = tokens.len();
        let mut token_counts = BTreeMap::new();
        for token in tokens {
            *token_counts.entry(token).or_insert(0) += 1;
        }
        Self { id: id.into(), raw_text, token_counts, token_len }
    }

    /// Returns the unique document identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the text the document was built from.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Returns term counts keyed by normalized term.
    pub fn token_counts(&self) -> &BTreeMap<String, usize> {
        &self.token_counts
    }

    /// Returns the total number of tokens, counting repeats.
    pub fn token_len(&self) -> usize {
        self.token_len
    }

    /// Returns `true` if normalization left no tokens.
    pub fn is_empty(&self) -> bool {
        self.token_len == 0
    }
}

/// A capability as published by the registry feed: description plus tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRecord {
    /// Unique capability identifier.
    pub id: String,
    /// Free-text description of what the capability does.
    pub description: String,
    /// Capability tags, for example `ocr` or `pdf-parsing`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Business category, for example `financial` or `it-ops`. Not indexed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl CapabilityRecord {
    /// Create a record without tags or category.
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self { id: id.into(), description: description.into(), tags: Vec::new(), category: None }
    }

    /// Set the capability tags.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the business category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns the indexed text: the description followed by the tags.
    pub fn text(&self) -> String {
        if self.tags.is_empty() {
            return self.description.clone();
        }
        format!("{} {}", self.description, self.tags.join(" "))
    }
}

impl<S: Into<String>, T: Into<String>> From<(S, T)> for CapabilityRecord {
    fn from((id, description): (S, T)) -> Self {
        Self::new(id, description)
    }
}

/// A corpus document paired with its cosine similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    /// The matched document's identifier.
    pub document_id: String,
    /// Cosine similarity in `[0, 1]`.
    pub score: f64,
}

impl SimilarityMatch {
    /// Returns a short explanation of what a match of this strength means.
    pub fn reason(&self) -> &'static str {
        if self.score >= 0.8 {
            "very similar, likely duplicate functionality"
        } else if self.score >= 0.6 {
            "high similarity, consider extending instead of building new"
        } else if self.score >= 0.4 {
            "moderate similarity, may share some components"
        } else {
            "some overlap, could reuse patterns"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_repeated_terms() {
        let doc = Document::new("d1", "Invoice invoice INVOICE parser");
        assert_eq!(doc.token_counts().get("invoice"), Some(&3));
        assert_eq!(doc.token_counts().get("parser"), Some(&1));
        assert_eq!(doc.token_len(), 4);
    }

    #[test]
    fn stop_word_only_text_is_empty() {
        let doc = Document::new("d1", "and the of");
        assert!(doc.is_empty());
        assert!(doc.token_counts().is_empty());
    }

    #[test]
    fn record_text_appends_tags() {
        let record = CapabilityRecord::new("ocr", "Reads scanned invoices").with_tags(["ocr", "pdf"]);
        assert_eq!(record.text(), "Reads scanned invoices ocr pdf");
        assert_eq!(CapabilityRecord::new("x", "plain").text(), "plain");
    }

    #[test]
    fn match_reason_follows_score_bands() {
        let at = |score| SimilarityMatch { document_id: "d".into(), score };
        assert!(at(0.85).reason().contains("duplicate"));
        assert!(at(0.6).reason().contains("extending"));
        assert!(at(0.45).reason().contains("components"));
        assert!(at(0.1).reason().contains("patterns"));
    }
}
