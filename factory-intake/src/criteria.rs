//! Criterion values and weights for multi-criteria prioritization.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IntakeError, Result};

/// Tolerance for the weight sum check.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// One of the five prioritization criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Expected return on investment, as a bounded percentile.
    Roi,
    /// Alignment with strategic priorities.
    StrategicValue,
    /// Time sensitivity.
    Urgency,
    /// Technical feasibility.
    Feasibility,
    /// Delivery or compliance risk. Higher is worse.
    Risk,
}

/// Whether a higher criterion value raises or lowers the priority score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Contribution is `weight * value * 100`.
    HigherIsBetter,
    /// Contribution is `weight * (1 - value) * 100`.
    HigherIsWorse,
}

impl Criterion {
    /// All criteria in canonical order.
    pub const ALL: [Criterion; 5] =
        [Self::Roi, Self::StrategicValue, Self::Urgency, Self::Feasibility, Self::Risk];

    /// Returns the canonical snake_case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Roi => "roi",
            Self::StrategicValue => "strategic_value",
            Self::Urgency => "urgency",
            Self::Feasibility => "feasibility",
            Self::Risk => "risk",
        }
    }

    /// Returns the polarity used when computing this criterion's contribution.
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Risk => Polarity::HigherIsWorse,
            _ => Polarity::HigherIsBetter,
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five criterion inputs for one request, each in `[0, 1]`.
///
/// Values are checked when the set is scored, so out-of-domain data from
/// upstream surfaces as [`IntakeError::InvalidCriterion`] instead of being
/// clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriterionSet {
    /// Return on investment percentile.
    pub roi: f64,
    /// Strategic value.
    pub strategic_value: f64,
    /// Urgency.
    pub urgency: f64,
    /// Feasibility.
    pub feasibility: f64,
    /// Risk. Higher is worse.
    pub risk: f64,
}

impl CriterionSet {
    /// Create a criterion set from its five values.
    pub const fn new(
        roi: f64,
        strategic_value: f64,
        urgency: f64,
        feasibility: f64,
        risk: f64,
    ) -> Self {
        Self { roi, strategic_value, urgency, feasibility, risk }
    }

    /// Returns the raw value of `criterion`.
    pub const fn get(&self, criterion: Criterion) -> f64 {
        match criterion {
            Criterion::Roi => self.roi,
            Criterion::StrategicValue => self.strategic_value,
            Criterion::Urgency => self.urgency,
            Criterion::Feasibility => self.feasibility,
            Criterion::Risk => self.risk,
        }
    }

    /// Check that every value is finite and inside `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidCriterion`] for the first offending
    /// criterion in canonical order.
    pub fn validate(&self) -> Result<()> {
        for criterion in Criterion::ALL {
            let value = self.get(criterion);
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(IntakeError::InvalidCriterion { criterion, value });
            }
        }
        Ok(())
    }
}

/// Validated weights for the five criteria, summing to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<Criterion, f64>", into = "BTreeMap<Criterion, f64>")]
pub struct CriterionWeights {
    weights: BTreeMap<Criterion, f64>,
}

impl CriterionWeights {
    /// Build weights from `(criterion, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidWeights`] if a criterion is repeated or
    /// missing, a weight is negative or not finite, or the weights do not sum
    /// to 1 within [`WEIGHT_SUM_TOLERANCE`].
    ///
    /// Accepted weights are rescaled by their sum, so the stored weights
    /// total 1 and a perfect request scores exactly 100.
    pub fn new(pairs: impl IntoIterator<Item = (Criterion, f64)>) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for (criterion, weight) in pairs {
            if !weight.is_finite() || weight < 0.0 {
                return Err(IntakeError::InvalidWeights(format!(
                    "weight for {criterion} must be a non-negative finite number, got {weight}"
                )));
            }
            if weights.insert(criterion, weight).is_some() {
                return Err(IntakeError::InvalidWeights(format!(
                    "weight for {criterion} given more than once"
                )));
            }
        }

        let missing: Vec<&str> = Criterion::ALL
            .iter()
            .filter(|c| !weights.contains_key(*c))
            .map(|c| c.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(IntakeError::InvalidWeights(format!(
                "missing weights for {}",
                missing.join(", ")
            )));
        }

        let sum: f64 = weights.values().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(IntakeError::InvalidWeights(format!("weights sum to {sum}, expected 1")));
        }
        if sum != 1.0 {
            for weight in weights.values_mut() {
                *weight /= sum;
            }
        }

        Ok(Self { weights })
    }

    /// Build weights from a map keyed by criterion name, as supplied by a
    /// service layer.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidWeights`] for unknown names and for every
    /// condition checked by [`CriterionWeights::new`].
    pub fn from_named<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        let mut parsed = Vec::new();
        for (name, weight) in pairs {
            let criterion = Criterion::ALL
                .into_iter()
                .find(|c| c.as_str() == name)
                .ok_or_else(|| IntakeError::InvalidWeights(format!("unknown criterion '{name}'")))?;
            parsed.push((criterion, weight));
        }
        Self::new(parsed)
    }

    /// Returns the weight of `criterion`.
    pub fn get(&self, criterion: Criterion) -> f64 {
        self.weights.get(&criterion).copied().unwrap_or(0.0)
    }

    /// Iterate over `(criterion, weight)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Criterion, f64)> + '_ {
        self.weights.iter().map(|(c, w)| (*c, *w))
    }
}

impl Default for CriterionWeights {
    /// ROI 30%, strategic value 25%, urgency 20%, feasibility 15%, risk 10%.
    fn default() -> Self {
        Self {
            weights: BTreeMap::from([
                (Criterion::Roi, 0.30),
                (Criterion::StrategicValue, 0.25),
                (Criterion::Urgency, 0.20),
                (Criterion::Feasibility, 0.15),
                (Criterion::Risk, 0.10),
            ]),
        }
    }
}

impl TryFrom<BTreeMap<Criterion, f64>> for CriterionWeights {
    type Error = IntakeError;

    fn try_from(map: BTreeMap<Criterion, f64>) -> Result<Self> {
        Self::new(map)
    }
}

impl From<CriterionWeights> for BTreeMap<Criterion, f64> {
    fn from(weights: CriterionWeights) -> Self {
        weights.weights
    }
}
