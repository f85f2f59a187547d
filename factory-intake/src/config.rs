//! Configuration for the intake pipeline.

use serde::{Deserialize, Serialize};

use crate::criteria::CriterionWeights;
use crate::error::{IntakeError, Result};

/// Configuration parameters for the intake pipeline.
///
/// Classification thresholds and tier boundaries are fixed constants
/// ([`DUPLICATE_THRESHOLD`](crate::DUPLICATE_THRESHOLD),
/// [`CRITICAL_BOUNDARY`](crate::CRITICAL_BOUNDARY)) and are not part of the
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntakeConfig {
    /// Number of top matches to report per evaluation.
    pub top_k: usize,
    /// Minimum similarity for a match to be reported.
    pub min_similarity: f64,
    /// Weights used when a request does not carry its own.
    pub weights: CriterionWeights,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self { top_k: 10, min_similarity: 0.0, weights: CriterionWeights::default() }
    }
}

impl IntakeConfig {
    /// Create a new builder for constructing an [`IntakeConfig`].
    pub fn builder() -> IntakeConfigBuilder {
        IntakeConfigBuilder::default()
    }

    /// Parse and validate a configuration from JSON. Missing fields take
    /// their default values.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::ConfigError`] if the JSON is malformed or the
    /// values fail the checks in [`IntakeConfigBuilder::build`].
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| IntakeError::ConfigError(format!("invalid config JSON: {e}")))?;
        IntakeConfigBuilder { config }.build()
    }
}

/// Builder for constructing a validated [`IntakeConfig`].
#[derive(Debug, Clone, Default)]
pub struct IntakeConfigBuilder {
    config: IntakeConfig,
}

impl IntakeConfigBuilder {
    /// Set the number of top matches to report.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity for reported matches.
    pub fn min_similarity(mut self, threshold: f64) -> Self {
        self.config.min_similarity = threshold;
        self
    }

    /// Set the default criterion weights.
    pub fn weights(mut self, weights: CriterionWeights) -> Self {
        self.config.weights = weights;
        self
    }

    /// Build the [`IntakeConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::ConfigError`] if:
    /// - `top_k == 0`
    /// - `min_similarity` is not inside `[0, 1]`
    pub fn build(self) -> Result<IntakeConfig> {
        if self.config.top_k == 0 {
            return Err(IntakeError::ConfigError("top_k must be greater than zero".to_string()));
        }
        let threshold = self.config.min_similarity;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(IntakeError::ConfigError(format!(
                "min_similarity ({threshold}) must be between 0 and 1"
            )));
        }
        Ok(self.config)
    }
}
