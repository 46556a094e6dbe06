//! Scored result types.
//!
//! Represents the output of the cardiovascular risk classifier after
//! thresholding.

use serde::{Deserialize, Serialize};

/// Binary risk classification shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLabel {
    /// Label for a binary prediction (1 = high risk).
    #[must_use]
    pub fn from_prediction(prediction: u8) -> Self {
        if prediction == 1 {
            Self::High
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::High => "High Risk",
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// Binary prediction (0 = low risk, 1 = high risk)
    pub prediction: u8,

    /// Positive-class probability, rounded to 4 decimal places
    pub probability: f64,

    /// Label derived from `prediction` only
    pub risk_label: RiskLabel,
}

impl ScoredResult {
    /// Threshold a positive-class probability.
    ///
    /// The comparison is inclusive and uses the unrounded probability; rounding
    /// only affects the reported value.
    #[must_use]
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let prediction = u8::from(probability >= threshold);
        Self {
            prediction,
            probability: round4(probability),
            risk_label: RiskLabel::from_prediction(prediction),
        }
    }

    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.prediction == 1
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
