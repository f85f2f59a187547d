//! Duplicate detection and prioritization for agent factory intake.
//!
//! This crate provides:
//! - Text normalization with stop-word removal and light stemming
//! - A TF-IDF corpus index with incremental insert and remove
//! - Cosine similarity search with duplicate / high-similarity / novel tiers
//! - Weighted multi-criteria priority scoring with fixed tiers
//! - A capability registry publishing copy-on-write snapshots
//! - An evaluation pipeline producing one [`Decision`] per request
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use factory_intake::{CapabilityRegistry, CriterionSet, IntakePipeline};
//!
//! let registry = Arc::new(CapabilityRegistry::new());
//! registry.register_capability("invoice-ocr", "automated invoice data extraction and validation")?;
//!
//! let pipeline = IntakePipeline::builder().registry(registry).build()?;
//! let decision = pipeline.evaluate_request(
//!     "extract and validate invoice data automatically",
//!     &CriterionSet::new(0.8, 0.7, 0.6, 0.9, 0.2),
//!     None,
//! )?;
//! assert!(decision.priority.is_none());
//! ```

pub mod config;
pub mod criteria;
pub mod document;
pub mod error;
pub mod extract;
pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod scorer;
pub mod search;
pub mod signals;
pub mod source;

pub use config::{IntakeConfig, IntakeConfigBuilder};
pub use criteria::{Criterion, CriterionSet, CriterionWeights, Polarity, WEIGHT_SUM_TOLERANCE};
pub use document::{CapabilityRecord, Document, SimilarityMatch};
pub use error::{IntakeError, Result};
pub use extract::{ExtractedRequest, GeneratedJsonExtractor, RequestExtractor, TextGenerator};
pub use index::{CorpusIndex, TermVector};
pub use normalize::normalize;
pub use pipeline::{Decision, IntakePipeline, IntakePipelineBuilder, IntakeRequest};
pub use registry::{CapabilityRegistry, CorpusSnapshot, ReusableComponent};
pub use scorer::{
    BOUNDARY_TOLERANCE, CRITICAL_BOUNDARY, HIGH_BOUNDARY, MEDIUM_BOUNDARY, PriorityRecord,
    PriorityTier, RankedRequest, rank_batch, score, score_batch,
};
pub use search::{
    DUPLICATE_THRESHOLD, HIGH_SIMILARITY_THRESHOLD, MatchTier, cosine_similarity, search,
    search_where, similar_to,
};
pub use signals::RawSignals;
pub use source::{CapabilitySource, StaticCapabilitySource};
