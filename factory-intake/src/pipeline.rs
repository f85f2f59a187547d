//! Evaluation pipeline orchestrator.
//!
//! The [`IntakePipeline`] runs one request through normalization, similarity
//! search against the current registry snapshot and, unless the request is a
//! duplicate, multi-criteria scoring. It produces a single [`Decision`].
//!
//! # Example
//!
//! ```rust,ignore
//! use factory_intake::{CapabilityRegistry, CriterionSet, IntakeConfig, IntakePipeline};
//!
//! let pipeline = IntakePipeline::builder()
//!     .config(IntakeConfig::default())
//!     .registry(Arc::new(CapabilityRegistry::new()))
//!     .build()?;
//!
//! let criteria = CriterionSet::new(0.8, 0.7, 0.6, 0.9, 0.2);
//! let decision = pipeline.evaluate_request("route IT tickets", &criteria, None)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::IntakeConfig;
use crate::criteria::{CriterionSet, CriterionWeights};
use crate::document::SimilarityMatch;
use crate::error::{IntakeError, Result};
use crate::extract::RequestExtractor;
use crate::registry::CapabilityRegistry;
use crate::scorer::{self, PriorityRecord};
use crate::search::MatchTier;

/// A request as submitted by a service layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRequest {
    /// Free-text description of the requested capability.
    pub text: String,
    /// Criterion values for prioritization.
    pub criteria: CriterionSet,
    /// Criterion weights keyed by name. The configured weights apply when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, f64>>,
}

/// The outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Reuse classification of the best match.
    pub classification: MatchTier,
    /// Reported matches, best first.
    pub matches: Vec<SimilarityMatch>,
    /// Priority record; `None` for duplicates.
    pub priority: Option<PriorityRecord>,
    /// What the requester should do next.
    pub recommendation: String,
}

impl Decision {
    /// Returns the best reported match, if any.
    pub fn best_match(&self) -> Option<&SimilarityMatch> {
        self.matches.first()
    }
}

/// The intake evaluation pipeline.
///
/// Construct one via [`IntakePipeline::builder()`].
pub struct IntakePipeline {
    config: IntakeConfig,
    registry: Arc<CapabilityRegistry>,
    extractor: Option<Arc<dyn RequestExtractor>>,
}

impl IntakePipeline {
    /// Create a new [`IntakePipelineBuilder`].
    pub fn builder() -> IntakePipelineBuilder {
        IntakePipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Return a reference to the capability registry.
    pub fn registry(&self) -> &Arc<CapabilityRegistry> {
        &self.registry
    }

    /// Evaluate a request: search, classify and, unless it is a duplicate,
    /// score.
    ///
    /// `weights` defaults to the configured weights.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidCriterion`] if the request is scored and
    /// a criterion value is out of domain.
    pub fn evaluate_request(
        &self,
        text: &str,
        criteria: &CriterionSet,
        weights: Option<&CriterionWeights>,
    ) -> Result<Decision> {
        let weights = weights.unwrap_or(&self.config.weights);
        let snapshot = self.registry.snapshot();

        // 1. Search the current snapshot
        let ranked = snapshot.search(text, self.config.top_k)?;
        let classification = MatchTier::of(&ranked);
        let best = ranked.first().cloned();

        // 2. Score unless the request duplicates an existing capability
        let priority = if classification.needs_priority() {
            let record = scorer::score(criteria, weights).inspect_err(|e| {
                error!(error = %e, "scoring failed");
            })?;
            Some(record)
        } else {
            None
        };

        // 3. Report matches above the configured floor
        let threshold = self.config.min_similarity;
        let matches: Vec<SimilarityMatch> =
            ranked.into_iter().filter(|m| m.score > 0.0 && m.score >= threshold).collect();

        let recommendation = recommend(classification, best.as_ref(), priority.as_ref());
        let best_score = best.as_ref().map_or(0.0, |m| m.score);
        match &priority {
            Some(record) => info!(
                classification = %classification,
                best_score,
                match_count = matches.len(),
                priority.score = record.score,
                priority.tier = %record.tier,
                "evaluated request"
            ),
            None => info!(
                classification = %classification,
                best_score,
                match_count = matches.len(),
                "evaluated request"
            ),
        }

        Ok(Decision { classification, matches, priority, recommendation })
    }

    /// Evaluate a request carrying its weights as a name-keyed map.
    ///
    /// The weights are validated before the search runs, so a malformed map
    /// fails the call even when the request turns out to be a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidWeights`] for a malformed weight map and
    /// every error of [`evaluate_request`](Self::evaluate_request).
    pub fn evaluate(&self, request: &IntakeRequest) -> Result<Decision> {
        let weights = match &request.weights {
            Some(named) => Some(
                CriterionWeights::from_named(named.iter().map(|(k, v)| (k.as_str(), *v)))
                    .inspect_err(|e| error!(error = %e, "rejected request weights"))?,
            ),
            None => None,
        };
        self.evaluate_request(&request.text, &request.criteria, weights.as_ref())
    }

    /// Extract a request from raw intake text with the configured extractor,
    /// then evaluate it with the configured weights.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::PipelineError`] if no extractor is configured,
    /// and propagates extraction and evaluation errors.
    pub async fn evaluate_raw(&self, raw_text: &str) -> Result<Decision> {
        let extractor = self.extractor.as_ref().ok_or_else(|| {
            IntakeError::PipelineError("no request extractor configured".to_string())
        })?;
        let request = extractor.extract(raw_text).await.inspect_err(|e| {
            error!(error = %e, "request extraction failed");
        })?;
        let criteria = request.criteria()?;
        self.evaluate_request(&request.description, &criteria, None)
    }

    /// Score a batch of criterion sets with the configured weights, ranked by
    /// descending score.
    pub fn rank(&self, batch: &[CriterionSet]) -> Vec<scorer::RankedRequest> {
        let ranked = scorer::rank_batch(batch, &self.config.weights);
        let failed = ranked.iter().filter(|r| r.outcome.is_err()).count();
        info!(batch_size = batch.len(), failed, "ranked request batch");
        ranked
    }
}

fn recommend(
    classification: MatchTier,
    best: Option<&SimilarityMatch>,
    priority: Option<&PriorityRecord>,
) -> String {
    let priority_text = priority.map(PriorityRecord::recommendation).unwrap_or_default();
    match (classification, best) {
        (MatchTier::Duplicate, Some(best)) => format!(
            "DUPLICATE: extend or reuse capability '{}' (similarity {:.2}) instead of building new.",
            best.document_id, best.score
        ),
        (MatchTier::HighSimilarity, Some(best)) => format!(
            "REVIEW: capability '{}' is a strong reuse candidate (similarity {:.2}); {}. {priority_text}",
            best.document_id,
            best.score,
            best.reason()
        ),
        _ => priority_text,
    }
}

/// Builder for constructing an [`IntakePipeline`].
///
/// The registry is required; the config defaults to
/// [`IntakeConfig::default()`] and the extractor is optional.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = IntakePipeline::builder()
///     .registry(Arc::new(registry))
///     .extractor(Arc::new(extractor))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct IntakePipelineBuilder {
    config: Option<IntakeConfig>,
    registry: Option<Arc<CapabilityRegistry>>,
    extractor: Option<Arc<dyn RequestExtractor>>,
}

impl IntakePipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: IntakeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the capability registry to search.
    pub fn registry(mut self, registry: Arc<CapabilityRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set an optional extractor for [`IntakePipeline::evaluate_raw`].
    pub fn extractor(mut self, extractor: Arc<dyn RequestExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Build the [`IntakePipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::ConfigError`] if the registry is missing or the
    /// registry is already closed.
    pub fn build(self) -> Result<IntakePipeline> {
        let registry = self
            .registry
            .ok_or_else(|| IntakeError::ConfigError("registry is required".to_string()))?;
        if registry.is_closed() {
            return Err(IntakeError::ConfigError("registry is closed".to_string()));
        }

        Ok(IntakePipeline {
            config: self.config.unwrap_or_default(),
            registry,
            extractor: self.extractor,
        })
    }
}
