//! Extraction of structured requests from raw intake text.
//!
//! The [`RequestExtractor`] trait is the seam the pipeline uses for
//! [`evaluate_raw`](crate::IntakePipeline::evaluate_raw).
//! [`GeneratedJsonExtractor`] implements it on top of any
//! [`TextGenerator`] by prompting for a JSON object and parsing the reply.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::criteria::CriterionSet;
use crate::error::{IntakeError, Result};
use crate::signals::RawSignals;

/// A request after extraction: the text to search with plus the signals to
/// score with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRequest {
    /// Problem statement and expected outcomes, used as the search query.
    pub description: String,
    /// Raw prioritization signals.
    pub signals: RawSignals,
}

impl ExtractedRequest {
    /// Convert the raw signals to a criterion set.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`RawSignals::to_criteria`].
    pub fn criteria(&self) -> Result<CriterionSet> {
        self.signals.to_criteria()
    }
}

/// Turns free-form intake text into an [`ExtractedRequest`].
#[async_trait]
pub trait RequestExtractor: Send + Sync {
    /// Extract the description and signals from `raw_text`.
    async fn extract(&self, raw_text: &str) -> Result<ExtractedRequest>;
}

/// A text-generation backend, such as a hosted language model.
///
/// Only the output contract matters to this crate: given a prompt, return
/// the generated text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Fields the generator is asked to return.
#[derive(Debug, Deserialize)]
struct GeneratedFields {
    #[serde(default)]
    agent_category: String,
    #[serde(default)]
    problem_statement: String,
    #[serde(default)]
    expected_outcomes: String,
    #[serde(default)]
    estimated_impact: String,
    #[serde(default)]
    urgency: String,
    #[serde(default)]
    resource_requirements: Option<String>,
    #[serde(default)]
    strategic_alignment: Option<u8>,
    #[serde(default)]
    technical_feasibility: Option<u8>,
    #[serde(default)]
    estimated_cost: Option<f64>,
    #[serde(default)]
    estimated_savings: Option<f64>,
}

/// A [`RequestExtractor`] that prompts a [`TextGenerator`] for JSON.
///
/// The reply may be bare JSON or wrapped in a markdown code fence.
///
/// # Example
///
/// ```rust,ignore
/// use factory_intake::GeneratedJsonExtractor;
///
/// let extractor = GeneratedJsonExtractor::new(Arc::new(my_model));
/// let request = extractor.extract("Finance needs invoices read automatically").await?;
/// ```
#[derive(Clone)]
pub struct GeneratedJsonExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl GeneratedJsonExtractor {
    /// Create an extractor over `generator`.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Build the extraction prompt for `raw_text`.
    pub fn prompt(raw_text: &str) -> String {
        format!(
            "Extract structured information from this agent request and return ONLY a JSON object.\n\n\
             {raw_text}\n\n\
             Fields:\n\
             - agent_category: one of financial, it-ops, compliance, customer-ops, data-analytics\n\
             - problem_statement: clear description of the problem\n\
             - expected_outcomes: what success looks like\n\
             - estimated_impact: high, medium or low\n\
             - urgency: critical, high, medium or low\n\
             - resource_requirements: optional description of the effort\n\
             - strategic_alignment: optional integer 1-10\n\
             - technical_feasibility: optional integer 1-10\n\
             - estimated_cost: optional number\n\
             - estimated_savings: optional number"
        )
    }

    /// Parse a generator reply into a request.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::ExtractionError`] if the reply is not a JSON
    /// object with the expected fields or carries no problem statement.
    pub fn parse_reply(reply: &str) -> Result<ExtractedRequest> {
        let payload = json_payload(reply);
        let fields: GeneratedFields = serde_json::from_str(payload).map_err(|e| {
            IntakeError::ExtractionError(format!("generator reply is not a request object: {e}"))
        })?;

        let problem = fields.problem_statement.trim();
        if problem.is_empty() {
            return Err(IntakeError::ExtractionError(
                "generator reply has no problem_statement".to_string(),
            ));
        }
        let outcomes = fields.expected_outcomes.trim();
        let description =
            if outcomes.is_empty() { problem.to_string() } else { format!("{problem} {outcomes}") };

        Ok(ExtractedRequest {
            description,
            signals: RawSignals {
                category: fields.agent_category,
                problem_statement: problem.to_string(),
                estimated_impact: fields.estimated_impact,
                urgency: fields.urgency,
                resource_requirements: fields.resource_requirements,
                strategic_alignment: fields.strategic_alignment,
                technical_feasibility: fields.technical_feasibility,
                estimated_cost: fields.estimated_cost,
                estimated_savings: fields.estimated_savings,
            },
        })
    }
}

#[async_trait]
impl RequestExtractor for GeneratedJsonExtractor {
    async fn extract(&self, raw_text: &str) -> Result<ExtractedRequest> {
        let reply = self.generator.generate(&Self::prompt(raw_text)).await.map_err(|e| {
            error!(error = %e, "text generation failed during extraction");
            match e {
                IntakeError::ExtractionError(_) => e,
                other => IntakeError::ExtractionError(format!("text generation failed: {other}")),
            }
        })?;
        debug!(reply_len = reply.len(), "received generator reply");
        Self::parse_reply(&reply).inspect_err(|e| {
            error!(error = %e, "failed to parse generator reply");
        })
    }
}

/// Returns the JSON text inside a reply, unwrapping a markdown code fence
/// (with or without a `json` language tag) when present.
pub fn json_payload(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let body = &trimmed[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedGenerator(std::result::Result<String, IntakeError>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("ONLY a JSON object"));
            self.0.clone()
        }
    }

    #[test]
    fn payload_unwraps_fences() {
        assert_eq!(json_payload("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(json_payload("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(json_payload("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(json_payload("Here you go:\n```json\n{\"a\":1}\n```\nThanks"), "{\"a\":1}");
    }

    #[test]
    fn parse_reply_joins_problem_and_outcomes() {
        let reply = r#"{"agent_category":"financial","problem_statement":"Invoices are keyed by hand",
                        "expected_outcomes":"Automated invoice capture","urgency":"high"}"#;
        let request = GeneratedJsonExtractor::parse_reply(reply).unwrap();
        assert_eq!(request.description, "Invoices are keyed by hand Automated invoice capture");
        assert_eq!(request.signals.urgency, "high");
        assert!((request.criteria().unwrap().urgency - 0.8).abs() < 1e-12);
    }

    #[test]
    fn parse_reply_requires_problem_statement() {
        let err = GeneratedJsonExtractor::parse_reply(r#"{"urgency":"low"}"#).unwrap_err();
        assert!(matches!(err, IntakeError::ExtractionError(_)));
        let err = GeneratedJsonExtractor::parse_reply("not json at all").unwrap_err();
        assert!(matches!(err, IntakeError::ExtractionError(_)));
    }

    #[tokio::test]
    async fn extract_parses_fenced_reply() {
        let reply = "```json\n{\"problem_statement\":\"Route IT tickets\",\"urgency\":\"low\"}\n```";
        let extractor = GeneratedJsonExtractor::new(Arc::new(CannedGenerator(Ok(reply.into()))));
        let request = extractor.extract("please route tickets").await.unwrap();
        assert_eq!(request.description, "Route IT tickets");
    }

    #[tokio::test]
    async fn generator_failure_becomes_extraction_error() {
        let failing = CannedGenerator(Err(IntakeError::PipelineError("quota exceeded".into())));
        let extractor = GeneratedJsonExtractor::new(Arc::new(failing));
        let err = extractor.extract("anything").await.unwrap_err();
        assert!(matches!(err, IntakeError::ExtractionError(msg) if msg.contains("quota exceeded")));
    }
}
