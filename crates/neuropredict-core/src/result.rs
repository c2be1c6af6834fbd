//! Prediction results and their display form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of one classification.
///
/// Deserialization rejects values [`PredictionResult::new`] could not have
/// produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPredictionResult")]
pub struct PredictionResult {
    /// Discrete class, 0 (low risk) or 1 (elevated risk).
    pub label: u8,
    /// Probability of the positive class, within [0, 1].
    pub probability: f64,
    pub positive: bool,
}

impl PredictionResult {
    /// Build a result, keeping `positive` consistent with `label` and the
    /// probability inside [0, 1].
    pub fn new(label: u8, probability: f64) -> Self {
        let label = u8::from(label == 1);
        Self {
            label,
            probability: probability.clamp(0.0, 1.0),
            positive: label == 1,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ResultError {
    #[error("label must be 0 or 1, got {0}")]
    Label(u8),
    #[error("probability must be within [0, 1], got {0}")]
    Probability(f64),
    #[error("positive={positive} contradicts label {label}")]
    Inconsistent { label: u8, positive: bool },
}

/// Wire form of [`PredictionResult`] before its invariants are checked.
#[derive(Deserialize)]
struct RawPredictionResult {
    label: u8,
    probability: f64,
    positive: bool,
}

impl TryFrom<RawPredictionResult> for PredictionResult {
    type Error = ResultError;

    fn try_from(raw: RawPredictionResult) -> Result<Self, Self::Error> {
        if raw.label > 1 {
            return Err(ResultError::Label(raw.label));
        }
        if !(0.0..=1.0).contains(&raw.probability) {
            return Err(ResultError::Probability(raw.probability));
        }
        if raw.positive != (raw.label == 1) {
            return Err(ResultError::Inconsistent {
                label: raw.label,
                positive: raw.positive,
            });
        }
        Ok(Self {
            label: raw.label,
            probability: raw.probability,
            positive: raw.positive,
        })
    }
}

/// Which of the two result narratives applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Narrative {
    ElevatedRisk,
    LowRisk,
}

impl Narrative {
    pub fn title(&self) -> &'static str {
        match self {
            Self::ElevatedRisk => "Elevated Risk Detected",
            Self::LowRisk => "Low Risk Profile",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ElevatedRisk => {
                "Based on the provided data, the model indicates an elevated \
                 risk profile for Alzheimer's Disease."
            }
            Self::LowRisk => {
                "Based on the provided data, the model indicates a lower \
                 risk profile for Alzheimer's Disease."
            }
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::ElevatedRisk => {
                "Recommendation: Consult with a neurologist for comprehensive evaluation."
            }
            Self::LowRisk => "Continue maintaining a healthy lifestyle and regular check-ups.",
        }
    }
}

/// UI-ready rendering of a [`PredictionResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayPayload {
    pub positive: bool,
    /// Probability scaled to 0–100.
    pub probability_percent: f64,
    /// `probability_percent` with one decimal and a percent sign, e.g. `"72.4%"`.
    pub probability_text: String,
    pub narrative: Narrative,
    pub title: &'static str,
    pub description: &'static str,
    pub recommendation: &'static str,
}

/// Turn a prediction into its display payload.
pub fn format(result: &PredictionResult) -> DisplayPayload {
    let narrative = if result.positive {
        Narrative::ElevatedRisk
    } else {
        Narrative::LowRisk
    };
    let probability_percent = result.probability * 100.0;

    DisplayPayload {
        positive: result.positive,
        probability_percent,
        probability_text: format!("{probability_percent:.1}%"),
        narrative,
        title: narrative.title(),
        description: narrative.description(),
        recommendation: narrative.recommendation(),
    }
}
