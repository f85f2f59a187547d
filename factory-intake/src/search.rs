//! Cosine similarity search and reuse classification.
//!
//! Queries are vectorized against the index's current statistics as
//! transient documents and ranked against every corpus document. The best
//! score is classified into a [`MatchTier`] using fixed thresholds so that
//! reuse decisions stay comparable across the corpus history.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::SimilarityMatch;
use crate::error::{IntakeError, Result};
use crate::index::{CorpusIndex, TermVector, l2_norm};

/// Best scores at or above this are duplicates.
pub const DUPLICATE_THRESHOLD: f64 = 0.80;

/// Best scores at or above this (and below [`DUPLICATE_THRESHOLD`]) are
/// strong reuse candidates.
pub const HIGH_SIMILARITY_THRESHOLD: f64 = 0.60;

/// Reuse classification of a request's best corpus match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchTier {
    /// Extend or reuse the existing capability instead of building new.
    Duplicate,
    /// Review the match before building; strong reuse candidate.
    HighSimilarity,
    /// No close match; proceed to prioritization.
    Novel,
}

impl MatchTier {
    /// Classify a best-match score.
    pub fn classify(best_score: f64) -> Self {
        if best_score >= DUPLICATE_THRESHOLD {
            Self::Duplicate
        } else if best_score >= HIGH_SIMILARITY_THRESHOLD {
            Self::HighSimilarity
        } else {
            Self::Novel
        }
    }

    /// Classify a ranked result by its first entry. Empty results are novel.
    pub fn of(matches: &[SimilarityMatch]) -> Self {
        matches.first().map_or(Self::Novel, |best| Self::classify(best.score))
    }

    /// Returns the canonical name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Duplicate => "DUPLICATE",
            Self::HighSimilarity => "HIGH_SIMILARITY",
            Self::Novel => "NOVEL",
        }
    }

    /// Returns `true` if a request in this tier should be prioritized.
    pub const fn needs_priority(self) -> bool {
        !matches!(self, Self::Duplicate)
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cosine similarity of two sparse non-negative vectors.
///
/// Returns 0.0 if either vector has zero magnitude. The dot product walks
/// `a` in term order, so `cosine_similarity(a, b)` and
/// `cosine_similarity(b, a)` agree exactly for vectors over the same terms.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f64 = a.iter().filter_map(|(term, x)| b.get(term).map(|y| x * y)).sum();
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Rank every corpus document against `query_text`.
///
/// Results are sorted by descending score with ties broken by ascending
/// document id, then truncated to `top_k`. Every document is listed, including
/// those with a zero score. [`IntakePipeline`](crate::IntakePipeline) drops
/// zero-score and below-`min_similarity` entries before reporting
/// [`Decision::matches`](crate::Decision::matches).
///
/// # Errors
///
/// Returns [`IntakeError::InvalidArgument`] if `top_k` is zero.
pub fn search(index: &CorpusIndex, query_text: &str, top_k: usize) -> Result<Vec<SimilarityMatch>> {
    search_where(index, query_text, top_k, |_| true)
}

/// Rank only the documents whose id passes `keep` against `query_text`.
///
/// The query and the candidates are still weighted with corpus-wide IDF, so
/// a candidate scores the same as it would in an unrestricted [`search`].
///
/// # Errors
///
/// Returns [`IntakeError::InvalidArgument`] if `top_k` is zero.
pub fn search_where(
    index: &CorpusIndex,
    query_text: &str,
    top_k: usize,
    keep: impl Fn(&str) -> bool,
) -> Result<Vec<SimilarityMatch>> {
    if top_k == 0 {
        return Err(IntakeError::InvalidArgument("top_k must be at least 1".to_string()));
    }
    let query = index.query_vector(query_text);
    Ok(rank(index, &query, keep, top_k))
}

/// Rank the corpus against a registered document's own text, excluding the
/// document itself.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidArgument`] if `limit` is zero or
/// [`IntakeError::NotFound`] if `id` is not indexed.
pub fn similar_to(index: &CorpusIndex, id: &str, limit: usize) -> Result<Vec<SimilarityMatch>> {
    if limit == 0 {
        return Err(IntakeError::InvalidArgument("limit must be at least 1".to_string()));
    }
    let vector = index.vector(id)?;
    Ok(rank(index, &vector, |candidate| candidate != id, limit))
}

fn rank(
    index: &CorpusIndex,
    query: &TermVector,
    keep: impl Fn(&str) -> bool,
    top_k: usize,
) -> Vec<SimilarityMatch> {
    let mut scored: Vec<SimilarityMatch> = index
        .documents()
        .filter(|doc| keep(doc.id()))
        .map(|doc| {
            let score = index
                .vector(doc.id())
                .map(|vector| cosine_similarity(query, &vector))
                .unwrap_or(0.0);
            SimilarityMatch { document_id: doc.id().to_string(), score }
        })
        .collect();

    scored.sort_by(compare_matches);
    scored.truncate(top_k);
    scored
}

/// Descending score, then ascending document id.
pub fn compare_matches(a: &SimilarityMatch, b: &SimilarityMatch) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.document_id.cmp(&b.document_id))
}
