//! Error types for the `factory-intake` crate.

use thiserror::Error;

use crate::criteria::Criterion;

/// Errors that can occur while indexing, searching, scoring, or evaluating.
///
/// Every variant is recoverable by the caller. Operations that mutate the
/// corpus validate their input first, so an error never leaves a partially
/// applied change behind.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum IntakeError {
    /// A call parameter was malformed (for example `top_k == 0`).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A document with the same identifier is already indexed.
    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    /// No document with the given identifier is indexed.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The weight map does not cover exactly the five criteria, contains a
    /// negative or non-finite weight, or does not sum to 1.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// A criterion value lies outside its `[0, 1]` domain.
    #[error("Invalid criterion {criterion}: {value} is outside [0, 1]")]
    InvalidCriterion {
        /// The offending criterion.
        criterion: Criterion,
        /// The rejected raw value.
        value: f64,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The text-generation collaborator returned output that could not be
    /// turned into a request.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// An error in the evaluation pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// A convenience result type for intake operations.
pub type Result<T> = std::result::Result<T, IntakeError>;
