//! Multi-criteria prioritization scoring.
//!
//! [`score`] turns a validated [`CriterionSet`] and [`CriterionWeights`]
//! into a [`PriorityRecord`]: a score in `[0, 100]`, a tier, and the
//! per-criterion contributions that sum to the score. Scoring is a pure
//! function; batch scoring is the same function mapped over the input.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::criteria::{Criterion, CriterionSet, CriterionWeights, Polarity};
use crate::error::Result;

/// Scores at or above this are [`PriorityTier::Critical`].
pub const CRITICAL_BOUNDARY: f64 = 80.0;
/// Scores at or above this are at least [`PriorityTier::High`].
pub const HIGH_BOUNDARY: f64 = 60.0;
/// Scores at or above this are at least [`PriorityTier::Medium`].
pub const MEDIUM_BOUNDARY: f64 = 40.0;

/// Floating-point noise absorbed when comparing a score to a tier boundary.
///
/// A weighted sum whose exact value is 80 may come out as
/// `79.99999999999999`; it must still be critical.
pub const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// Priority tier derived from a bounded score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriorityTier {
    /// Fast-track for the next sprint.
    Critical,
    /// Schedule for the current quarter.
    High,
    /// Add to the backlog for next quarter.
    Medium,
    /// Consider for the future roadmap.
    Low,
}

impl PriorityTier {
    /// Map a score to its tier. Each boundary belongs to the higher tier.
    pub fn from_score(score: f64) -> Self {
        let reaches = |boundary: f64| score + BOUNDARY_TOLERANCE >= boundary;
        if reaches(CRITICAL_BOUNDARY) {
            Self::Critical
        } else if reaches(HIGH_BOUNDARY) {
            Self::High
        } else if reaches(MEDIUM_BOUNDARY) {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Returns the canonical name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Returns an actionable recommendation citing `score`.
    pub fn recommendation(self, score: f64) -> String {
        match self {
            Self::Critical => format!(
                "IMMEDIATE ACTION: fast-track this request for the next sprint. Score: {score:.1}/100. High strategic value and urgency."
            ),
            Self::High => format!(
                "HIGH PRIORITY: schedule for the current quarter. Score: {score:.1}/100. Strong business case with good feasibility."
            ),
            Self::Medium => format!(
                "STANDARD PRIORITY: add to the backlog for next quarter. Score: {score:.1}/100. Solid value but not urgent."
            ),
            Self::Low => format!(
                "LOW PRIORITY: consider for the future roadmap. Score: {score:.1}/100. Refine requirements or defer."
            ),
        }
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of scoring one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRecord {
    /// Weighted score in `[0, 100]`.
    pub score: f64,
    /// Tier derived from `score`.
    pub tier: PriorityTier,
    /// Weighted contribution of each criterion; sums to `score`.
    pub contributions: BTreeMap<Criterion, f64>,
    /// Per-criterion explanations.
    pub reasoning: Vec<String>,
}

impl PriorityRecord {
    /// Returns the tier recommendation for this record.
    pub fn recommendation(&self) -> String {
        self.tier.recommendation(self.score)
    }
}

/// Score one criterion set.
///
/// # Errors
///
/// Returns [`IntakeError::InvalidCriterion`](crate::IntakeError::InvalidCriterion)
/// if any value is outside `[0, 1]`. Weights are validated when
/// [`CriterionWeights`] is constructed.
pub fn score(criteria: &CriterionSet, weights: &CriterionWeights) -> Result<PriorityRecord> {
    criteria.validate()?;

    let contributions: BTreeMap<Criterion, f64> = Criterion::ALL
        .into_iter()
        .map(|criterion| {
            let value = criteria.get(criterion);
            let effective = match criterion.polarity() {
                Polarity::HigherIsBetter => value,
                Polarity::HigherIsWorse => 1.0 - value,
            };
            (criterion, weights.get(criterion) * effective * 100.0)
        })
        .collect();

    // Weights total 1, so the clamp only absorbs rounding in the last bits.
    let score = contributions.values().sum::<f64>().clamp(0.0, 100.0);
    Ok(PriorityRecord {
        score,
        tier: PriorityTier::from_score(score),
        contributions,
        reasoning: reasoning(criteria),
    })
}

/// Score each criterion set independently, preserving input order.
///
/// Equivalent to calling [`score`] on every item; a failing item does not
/// affect the others.
pub fn score_batch(
    batch: &[CriterionSet],
    weights: &CriterionWeights,
) -> Vec<Result<PriorityRecord>> {
    batch.iter().map(|criteria| score(criteria, weights)).collect()
}

/// A batch item with its position in the input and its scoring outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRequest {
    /// Position of the item in the submitted batch.
    pub position: usize,
    /// The priority record, or the validation error for this item.
    pub outcome: Result<PriorityRecord>,
}

/// Score a batch and order it by descending score.
///
/// Ties keep input order. Items that failed validation sort last, also in
/// input order.
pub fn rank_batch(batch: &[CriterionSet], weights: &CriterionWeights) -> Vec<RankedRequest> {
    let mut ranked: Vec<RankedRequest> = score_batch(batch, weights)
        .into_iter()
        .enumerate()
        .map(|(position, outcome)| RankedRequest { position, outcome })
        .collect();

    ranked.sort_by(|a, b| match (&a.outcome, &b.outcome) {
        (Ok(x), Ok(y)) => y.score.partial_cmp(&x.score).unwrap_or(Ordering::Equal),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => Ordering::Equal,
    }
    .then_with(|| a.position.cmp(&b.position)));
    ranked
}

fn reasoning(criteria: &CriterionSet) -> Vec<String> {
    let band = |value: f64, strong: &str, moderate: &str, weak: &str| {
        if value >= 0.8 {
            strong.to_string()
        } else if value >= 0.5 {
            moderate.to_string()
        } else {
            weak.to_string()
        }
    };

    vec![
        band(
            criteria.roi,
            "Strong ROI potential with high expected value",
            "Moderate ROI with positive impact expected",
            "Lower ROI, consider cost optimization",
        ),
        band(
            criteria.strategic_value,
            "Strongly aligned with strategic priorities",
            "Moderate strategic alignment",
            "Limited strategic alignment, may defer",
        ),
        band(
            criteria.urgency,
            "Time-sensitive request requiring immediate attention",
            "Moderate urgency, schedule within the current quarter",
            "Lower urgency, can be scheduled for a future sprint",
        ),
        band(
            criteria.feasibility,
            "Highly feasible with existing capabilities",
            "Moderate complexity, requires planning",
            "High complexity, significant resources needed",
        ),
        // Risk reads inverted: a high value is the weak case.
        band(
            1.0 - criteria.risk,
            "Low delivery and compliance risk",
            "Manageable risk with mitigation",
            "Elevated risk, needs compliance review",
        ),
    ]
}
