//! Conversion of raw intake signals into the `[0, 1]` criterion domain.
//!
//! Intake submissions describe a request with labels (`high`, `critical`),
//! 1 to 10 ratings and optional cost figures. [`RawSignals::to_criteria`]
//! maps each of them onto a [`CriterionSet`] on a 0 to 10 scale, then
//! divides by ten.

use serde::{Deserialize, Serialize};

use crate::criteria::CriterionSet;
use crate::error::{IntakeError, Result};

const COMPLIANCE_TERMS: [&str; 5] = ["compliance", "regulatory", "audit", "gdpr", "sox"];
const SECURITY_TERMS: [&str; 3] = ["security", "privacy", "risk"];

/// The unstructured-but-typed signals submitted with a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSignals {
    /// Agent category, for example `financial` or `it-ops`.
    pub category: String,
    /// Free-text problem statement.
    pub problem_statement: String,
    /// Estimated business impact: `high`, `medium` or `low`.
    pub estimated_impact: String,
    /// Urgency label: `critical`, `high`, `medium` or `low`.
    pub urgency: String,
    /// Free-text description of the resources the build needs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_requirements: Option<String>,
    /// Strategic alignment rating from 1 to 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategic_alignment: Option<u8>,
    /// Technical feasibility rating from 1 to 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical_feasibility: Option<u8>,
    /// Estimated build cost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,
    /// Estimated savings once delivered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_savings: Option<f64>,
}

impl RawSignals {
    /// Convert to a criterion set.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidArgument`] if a rating lies outside
    /// `1..=10` or a cost figure is not finite.
    pub fn to_criteria(&self) -> Result<CriterionSet> {
        let criteria = CriterionSet::new(
            self.roi_score()? / 10.0,
            self.strategic_score()? / 10.0,
            urgency_score(&self.urgency) / 10.0,
            self.feasibility_score()? / 10.0,
            self.risk_score() / 10.0,
        );
        criteria.validate()?;
        Ok(criteria)
    }

    fn roi_score(&self) -> Result<f64> {
        if let (Some(cost), Some(savings)) = (self.estimated_cost, self.estimated_savings) {
            if !cost.is_finite() || !savings.is_finite() {
                return Err(IntakeError::InvalidArgument(format!(
                    "cost figures must be finite, got cost {cost} and savings {savings}"
                )));
            }
            // Zero savings counts as not estimated.
            if cost > 0.0 && savings != 0.0 {
                let roi = (savings - cost) / cost;
                return Ok((5.0 + roi).clamp(0.0, 10.0));
            }
        }
        Ok(match self.estimated_impact.trim().to_lowercase().as_str() {
            "high" => 9.0,
            "medium" => 6.0,
            "low" => 3.0,
            _ => 5.0,
        })
    }

    fn strategic_score(&self) -> Result<f64> {
        if let Some(rating) = self.strategic_alignment {
            return rating_score("strategic_alignment", rating);
        }
        Ok(match self.category.trim().to_lowercase().as_str() {
            "financial" => 8.0,
            "compliance" => 9.0,
            "it-ops" => 6.0,
            "customer-ops" => 7.0,
            "data-analytics" => 6.0,
            _ => 5.0,
        })
    }

    fn feasibility_score(&self) -> Result<f64> {
        if let Some(rating) = self.technical_feasibility {
            return rating_score("technical_feasibility", rating);
        }
        let Some(resources) = &self.resource_requirements else {
            return Ok(6.0);
        };
        let resources = resources.to_lowercase();
        let score = if resources.contains("complex") || resources.contains("extensive") {
            4.0
        } else if resources.contains("moderate") {
            6.0
        } else if resources.contains("simple") || resources.contains("minimal") {
            9.0
        } else {
            6.0
        };
        Ok(score)
    }

    /// Complement of the mitigation rating: compliance terms rate 9,
    /// security terms 7, anything else 5.
    fn risk_score(&self) -> f64 {
        let problem = self.problem_statement.to_lowercase();
        let mitigation = if COMPLIANCE_TERMS.iter().any(|term| problem.contains(term)) {
            9.0
        } else if SECURITY_TERMS.iter().any(|term| problem.contains(term)) {
            7.0
        } else {
            5.0
        };
        10.0 - mitigation
    }
}

fn urgency_score(label: &str) -> f64 {
    match label.trim().to_lowercase().as_str() {
        "critical" => 10.0,
        "high" => 8.0,
        "medium" => 5.0,
        "low" => 2.0,
        _ => 5.0,
    }
}

fn rating_score(field: &str, rating: u8) -> Result<f64> {
    if !(1..=10).contains(&rating) {
        return Err(IntakeError::InvalidArgument(format!(
            "{field} must be between 1 and 10, got {rating}"
        )));
    }
    Ok(f64::from(rating))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn labels_map_to_defaults() {
        let signals = RawSignals {
            category: "Financial".into(),
            estimated_impact: "HIGH".into(),
            urgency: "critical".into(),
            ..Default::default()
        };
        let criteria = signals.to_criteria().unwrap();
        assert!(close(criteria.roi, 0.9));
        assert!(close(criteria.strategic_value, 0.8));
        assert!(close(criteria.urgency, 1.0));
        assert!(close(criteria.feasibility, 0.6));
        assert!(close(criteria.risk, 0.5));
    }

    #[test]
    fn unknown_labels_fall_back_to_midpoint() {
        let criteria = RawSignals::default().to_criteria().unwrap();
        assert!(close(criteria.roi, 0.5));
        assert!(close(criteria.strategic_value, 0.5));
        assert!(close(criteria.urgency, 0.5));
    }

    #[test]
    fn cost_figures_override_impact() {
        let signals = RawSignals {
            estimated_impact: "low".into(),
            estimated_cost: Some(10_000.0),
            estimated_savings: Some(30_000.0),
            ..Default::default()
        };
        // roi = 2x, so 5 + 2 = 7 on the ten-point scale.
        assert!(close(signals.to_criteria().unwrap().roi, 0.7));

        let losing = RawSignals {
            estimated_cost: Some(10_000.0),
            estimated_savings: Some(5_000.0),
            ..Default::default()
        };
        // roi = -0.5
        assert!(close(losing.to_criteria().unwrap().roi, 0.45));
    }

    #[test]
    fn zero_savings_falls_back_to_impact() {
        let signals = RawSignals {
            estimated_impact: "high".into(),
            estimated_cost: Some(10_000.0),
            estimated_savings: Some(0.0),
            ..Default::default()
        };
        assert!(close(signals.to_criteria().unwrap().roi, 0.9));
    }

    #[test]
    fn roi_is_clamped_to_scale() {
        let signals = RawSignals {
            estimated_cost: Some(1.0),
            estimated_savings: Some(1_000.0),
            ..Default::default()
        };
        assert!(close(signals.to_criteria().unwrap().roi, 1.0));
    }

    #[test]
    fn ratings_override_keyword_defaults() {
        let signals = RawSignals {
            category: "compliance".into(),
            resource_requirements: Some("extensive integration".into()),
            strategic_alignment: Some(3),
            technical_feasibility: Some(7),
            ..Default::default()
        };
        let criteria = signals.to_criteria().unwrap();
        assert!(close(criteria.strategic_value, 0.3));
        assert!(close(criteria.feasibility, 0.7));
    }

    #[test]
    fn resource_keywords_set_feasibility() {
        let at = |text: &str| {
            RawSignals { resource_requirements: Some(text.into()), ..Default::default() }
                .to_criteria()
                .unwrap()
                .feasibility
        };
        assert!(close(at("Complex ERP integration"), 0.4));
        assert!(close(at("moderate effort"), 0.6));
        assert!(close(at("minimal setup"), 0.9));
        assert!(close(at("two engineers"), 0.6));
    }

    #[test]
    fn problem_keywords_set_risk() {
        let at = |text: &str| {
            RawSignals { problem_statement: text.into(), ..Default::default() }
                .to_criteria()
                .unwrap()
                .risk
        };
        assert!(close(at("Quarterly SOX audit evidence"), 0.1));
        assert!(close(at("Privacy review backlog"), 0.3));
        assert!(close(at("Slow invoice approvals"), 0.5));
    }

    #[test]
    fn out_of_range_rating_is_rejected() {
        let signals = RawSignals { strategic_alignment: Some(11), ..Default::default() };
        assert!(matches!(signals.to_criteria(), Err(IntakeError::InvalidArgument(_))));
        let zero = RawSignals { technical_feasibility: Some(0), ..Default::default() };
        assert!(matches!(zero.to_criteria(), Err(IntakeError::InvalidArgument(_))));
    }

    #[test]
    fn non_finite_cost_is_rejected() {
        let signals = RawSignals {
            estimated_cost: Some(f64::NAN),
            estimated_savings: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(signals.to_criteria(), Err(IntakeError::InvalidArgument(_))));
    }

    #[test]
    fn deserializes_partial_payload() {
        let json = r#"{"category":"it-ops","urgency":"high","technical_feasibility":8}"#;
        let signals: RawSignals = serde_json::from_str(json).unwrap();
        assert_eq!(signals.technical_feasibility, Some(8));
        assert!(signals.estimated_cost.is_none());
    }
}
