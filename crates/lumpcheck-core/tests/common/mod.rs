#![allow(dead_code)]

use lumpcheck_core::features::TOP_TEN_FEATURES;
use lumpcheck_core::{
    Label, LabelOnlyClassifier, ProbabilisticClassifier, ProbabilityPair, Result, ScaledVector,
    StandardScaler,
};

/// Returns the same malignant probability for every input.
pub struct FixedProbability(pub f64);

impl ProbabilisticClassifier for FixedProbability {
    fn predict_proba(&self, _input: &ScaledVector) -> Result<ProbabilityPair> {
        ProbabilityPair::from_malignant(self.0)
    }
}

/// Logistic over the mean of the scaled values.
pub struct MeanLogistic;

impl ProbabilisticClassifier for MeanLogistic {
    fn predict_proba(&self, input: &ScaledVector) -> Result<ProbabilityPair> {
        let z = input.values().iter().sum::<f64>() / input.len() as f64;
        ProbabilityPair::from_malignant(1.0 / (1.0 + (-z).exp()))
    }
}

pub struct FixedLabel(pub Label);

impl LabelOnlyClassifier for FixedLabel {
    fn predict(&self, _input: &ScaledVector) -> Result<Label> {
        Ok(self.0)
    }
}

/// Scaler over the top-ten features with WDBC-like statistics.
pub fn top_ten_scaler() -> StandardScaler {
    StandardScaler::from_parts(
        TOP_TEN_FEATURES.iter().map(|s| s.to_string()).collect(),
        vec![0.11, 0.05, 16.3, 92.0, 880.0, 655.0, 14.1, 107.3, 0.09, 0.27],
        vec![0.07, 0.04, 4.8, 24.3, 569.0, 351.6, 3.5, 33.6, 0.08, 0.21],
    )
    .expect("valid scaler statistics")
}

/// The malignant-looking fixture used across tests.
pub fn malignant_fixture() -> Vec<(&'static str, f64)> {
    vec![
        ("concave points_worst", 0.25),
        ("concave points_mean", 0.15),
        ("radius_worst", 25.0),
        ("perimeter_mean", 120.0),
        ("area_worst", 2000.0),
        ("area_mean", 1000.0),
        ("radius_mean", 18.0),
        ("perimeter_worst", 160.0),
        ("concavity_mean", 0.3),
        ("concavity_worst", 0.4),
    ]
}
