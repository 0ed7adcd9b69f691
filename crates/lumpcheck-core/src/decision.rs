//! Threshold decision over the malignant-class probability.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{LumpError, Result};

/// Default cutoff. Sits below 0.5 to favour sensitivity to malignancy.
pub const DEFAULT_THRESHOLD: f64 = 0.40;

/// Advisory band for highlighting rows; never used to decide a label.
pub const BORDERLINE_BAND: RangeInclusive<f64> = 0.55..=0.85;

/// Tolerance for `benign + malignant == 1`.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(LumpError::InvalidThreshold(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

/// Shows the exact cutoff applied, never a rounded one.
impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Threshold {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let value: f64 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a number"))?;
        Threshold::new(value).map_err(|e| e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Benign,
    Malignant,
}

impl Label {
    /// Map a model class index (0 = benign, 1 = malignant).
    pub fn from_class(class: i64) -> Result<Self> {
        match class {
            0 => Ok(Label::Benign),
            1 => Ok(Label::Malignant),
            other => Err(LumpError::inference(format!(
                "model returned unknown class {other}"
            ))),
        }
    }

    pub fn class(self) -> i64 {
        match self {
            Label::Benign => 0,
            Label::Malignant => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Benign => "Benign",
            Label::Malignant => "Malignant",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class probabilities for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbabilityPair {
    benign: f64,
    malignant: f64,
}

impl ProbabilityPair {
    pub fn new(benign: f64, malignant: f64) -> Result<Self> {
        let in_range = |p: f64| (0.0..=1.0).contains(&p);
        if !in_range(benign) || !in_range(malignant) {
            return Err(LumpError::inference(format!(
                "probabilities out of range: benign={benign}, malignant={malignant}"
            )));
        }
        if (benign + malignant - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(LumpError::inference(format!(
                "probabilities do not sum to 1: benign={benign}, malignant={malignant}"
            )));
        }
        Ok(Self { benign, malignant })
    }

    pub fn from_malignant(malignant: f64) -> Result<Self> {
        Self::new(1.0 - malignant, malignant)
    }

    /// Certain pair for a hard label, used in direct-label mode.
    pub fn certain(label: Label) -> Self {
        match label {
            Label::Benign => Self {
                benign: 1.0,
                malignant: 0.0,
            },
            Label::Malignant => Self {
                benign: 0.0,
                malignant: 1.0,
            },
        }
    }

    pub fn benign(&self) -> f64 {
        self.benign
    }

    pub fn malignant(&self) -> f64 {
        self.malignant
    }

    pub fn benign_percent(&self) -> f64 {
        self.benign * 100.0
    }

    pub fn malignant_percent(&self) -> f64 {
        self.malignant * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionMode {
    /// Label comes from comparing the malignant probability to a threshold.
    ProbabilityThreshold,
    /// Label comes straight from the model's `predict`.
    DirectLabel,
}

/// Malignant iff `p_malignant >= threshold`. Equality favours Malignant.
pub fn decide(probabilities: &ProbabilityPair, threshold: Threshold) -> Label {
    if probabilities.malignant >= threshold.value() {
        Label::Malignant
    } else {
        Label::Benign
    }
}

pub fn is_borderline(probabilities: &ProbabilityPair) -> bool {
    BORDERLINE_BAND.contains(&probabilities.malignant)
}

/// Outcome of one pass through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    pub probabilities: ProbabilityPair,
    pub mode: DecisionMode,
    /// Threshold applied; absent in direct-label mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Threshold>,
    pub borderline: bool,
}

impl Prediction {
    pub fn from_probabilities(probabilities: ProbabilityPair, threshold: Threshold) -> Self {
        Self {
            label: decide(&probabilities, threshold),
            probabilities,
            mode: DecisionMode::ProbabilityThreshold,
            threshold: Some(threshold),
            borderline: is_borderline(&probabilities),
        }
    }

    pub fn from_label(label: Label) -> Self {
        Self {
            label,
            probabilities: ProbabilityPair::certain(label),
            mode: DecisionMode::DirectLabel,
            threshold: None,
            borderline: false,
        }
    }
}
