//! Prediction pipeline: feature vector -> scaler -> classifier -> decision.
//!
//! A [`Predictor`] is built once from the loaded artifacts and then shared
//! by reference with every request. It holds no mutable state.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::decision::{DecisionMode, Label, Prediction, Threshold};
use crate::error::{LumpError, Result};
use crate::features::{FeatureSchema, FeatureVector};
use crate::inference::{load_classifier, Classifier, ModelIo};
use crate::scaler::{ScaledVector, StandardScaler};
use crate::table::Table;

pub const PREDICTION_COLUMN: &str = "Prediction";
pub const BENIGN_COLUMN: &str = "Benign_Probability(%)";
pub const MALIGNANT_COLUMN: &str = "Malignant_Probability(%)";
pub const BORDERLINE_COLUMN: &str = "Borderline";

/// Where the artifacts live and how to talk to the model.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    #[serde(default)]
    pub io: ModelIo,
}

#[derive(Debug)]
pub struct Predictor {
    scaler: StandardScaler,
    classifier: Classifier,
}

impl Predictor {
    pub fn new(scaler: StandardScaler, classifier: Classifier) -> Self {
        Self { scaler, classifier }
    }

    /// Load both artifacts. Errors are fatal: the caller should not start
    /// serving requests without a predictor.
    pub fn load(config: &PredictorConfig) -> Result<Self> {
        let scaler = StandardScaler::load(&config.scaler_path)?;
        let classifier = load_classifier(&config.model_path, config.io.clone())?;

        info!(
            features = scaler.n_features(),
            mode = ?classifier.mode(),
            "predictor ready"
        );
        Ok(Self::new(scaler, classifier))
    }

    /// Required features, in fitted order.
    pub fn schema(&self) -> &FeatureSchema {
        self.scaler.schema()
    }

    pub fn mode(&self) -> DecisionMode {
        self.classifier.mode()
    }

    pub fn predict(&self, vector: &FeatureVector, threshold: Threshold) -> Result<Prediction> {
        let scaled = self.scaler.transform(vector)?;
        self.classify(&scaled, threshold)
    }

    fn classify(&self, scaled: &ScaledVector, threshold: Threshold) -> Result<Prediction> {
        let prediction = match &self.classifier {
            Classifier::Probabilistic(model) => {
                let probabilities = model.predict_proba(scaled)?;
                Prediction::from_probabilities(probabilities, threshold)
            }
            Classifier::LabelOnly(model) => Prediction::from_label(model.predict(scaled)?),
        };

        debug!(
            label = %prediction.label,
            p_malignant = prediction.probabilities.malignant(),
            "prediction complete"
        );
        Ok(prediction)
    }

    /// Manual entry path: unfilled features are 0.0.
    pub fn predict_manual(
        &self,
        entries: &BTreeMap<String, f64>,
        threshold: Threshold,
    ) -> Result<Prediction> {
        let vector = self.schema().build_manual(entries);
        self.predict(&vector, threshold)
    }

    /// Predict every row of a table.
    ///
    /// Column presence is checked once for the whole table; a missing column
    /// rejects the batch before any row runs. Rows are parsed into one matrix
    /// and scaled together, then scored in parallel; output order follows
    /// input order. Any row error rejects the whole batch.
    pub fn run_batch(&self, table: &Table, threshold: Threshold) -> Result<BatchOutcome> {
        let schema = self.schema();
        let indices = schema.locate(table.headers())?;

        let vectors = table
            .rows()
            .par_iter()
            .enumerate()
            .map(|(i, row)| schema.build_row(row, &indices, i + 1))
            .collect::<Result<Vec<FeatureVector>>>()?;

        let values: Vec<f64> = vectors
            .iter()
            .flat_map(|v| v.values().iter().copied())
            .collect();
        let matrix = Array2::from_shape_vec((vectors.len(), schema.len()), values)
            .map_err(|e| LumpError::malformed(format!("cannot assemble feature matrix: {e}")))?;
        let scaled = self.scaler.transform_batch(matrix)?;

        let rows: Vec<ScaledVector> = scaled
            .outer_iter()
            .map(|row| ScaledVector::new(row.to_vec()))
            .collect();
        let predictions = rows
            .par_iter()
            .map(|row| self.classify(row, threshold))
            .collect::<Result<Vec<Prediction>>>()?;

        let outcome = BatchOutcome {
            input: table.clone(),
            predictions,
            threshold,
        };
        let summary = outcome.summary();
        info!(
            rows = summary.total,
            malignant = summary.malignant,
            borderline = summary.borderline,
            "batch complete"
        );
        Ok(outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub benign: usize,
    pub malignant: usize,
    pub borderline: usize,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    input: Table,
    predictions: Vec<Prediction>,
    threshold: Threshold,
}

impl BatchOutcome {
    pub fn input(&self) -> &Table {
        &self.input
    }

    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    pub fn summary(&self) -> BatchSummary {
        let malignant = self
            .predictions
            .iter()
            .filter(|p| p.label == Label::Malignant)
            .count();
        BatchSummary {
            total: self.predictions.len(),
            benign: self.predictions.len() - malignant,
            malignant,
            borderline: self.predictions.iter().filter(|p| p.borderline).count(),
        }
    }

    /// Original columns plus label and percentage columns, optionally with a
    /// borderline marker.
    pub fn to_table(&self, include_borderline: bool) -> Result<Table> {
        let mut table = self.input.clone();

        let labels = self.predictions.iter().map(|p| p.label.to_string()).collect();
        let benign = self
            .predictions
            .iter()
            .map(|p| format!("{:.2}", p.probabilities.benign_percent()))
            .collect();
        let malignant = self
            .predictions
            .iter()
            .map(|p| format!("{:.2}", p.probabilities.malignant_percent()))
            .collect();

        table.push_column(PREDICTION_COLUMN, labels)?;
        table.push_column(BENIGN_COLUMN, benign)?;
        table.push_column(MALIGNANT_COLUMN, malignant)?;

        if include_borderline {
            let flags = self
                .predictions
                .iter()
                .map(|p| if p.borderline { "yes" } else { "" }.to_string())
                .collect();
            table.push_column(BORDERLINE_COLUMN, flags)?;
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::ProbabilityPair;
    use crate::inference::{LabelOnlyClassifier, ProbabilisticClassifier};

    /// Malignant probability is a logistic function of the first scaled value.
    struct Logistic;

    impl ProbabilisticClassifier for Logistic {
        fn predict_proba(&self, input: &ScaledVector) -> Result<ProbabilityPair> {
            let z = input.values()[0];
            ProbabilityPair::from_malignant(1.0 / (1.0 + (-z).exp()))
        }
    }

    struct AlwaysBenign;

    impl LabelOnlyClassifier for AlwaysBenign {
        fn predict(&self, _input: &ScaledVector) -> Result<Label> {
            Ok(Label::Benign)
        }
    }

    fn scaler() -> StandardScaler {
        StandardScaler::from_parts(
            vec!["radius_mean".into(), "area_mean".into()],
            vec![14.0, 650.0],
            vec![3.5, 350.0],
        )
        .unwrap()
    }

    fn predictor() -> Predictor {
        Predictor::new(scaler(), Classifier::Probabilistic(Box::new(Logistic)))
    }

    #[test]
    fn predict_applies_scaler_then_threshold() {
        let p = predictor();
        // radius 14.0 scales to 0 -> p = 0.5
        let vector = FeatureVector::from_pairs([("radius_mean", 14.0), ("area_mean", 0.0)]);
        let prediction = p.predict(&vector, Threshold::default()).unwrap();

        assert!((prediction.probabilities.malignant() - 0.5).abs() < 1e-12);
        assert_eq!(prediction.label, Label::Malignant);
        assert_eq!(prediction.mode, DecisionMode::ProbabilityThreshold);

        let strict = Threshold::new(0.6).unwrap();
        assert_eq!(p.predict(&vector, strict).unwrap().label, Label::Benign);
    }

    #[test]
    fn manual_entry_fills_missing_with_zero() {
        let p = predictor();
        let prediction = p
            .predict_manual(&BTreeMap::new(), Threshold::default())
            .unwrap();
        // radius 0.0 scales to -4 -> p ~= 0.018
        assert_eq!(prediction.label, Label::Benign);
    }

    #[test]
    fn label_only_model_skips_threshold() {
        let p = Predictor::new(scaler(), Classifier::LabelOnly(Box::new(AlwaysBenign)));
        let vector = FeatureVector::from_pairs([("radius_mean", 30.0), ("area_mean", 2000.0)]);

        for t in [0.0, 0.4, 1.0] {
            let prediction = p.predict(&vector, Threshold::new(t).unwrap()).unwrap();
            assert_eq!(prediction.label, Label::Benign);
            assert_eq!(prediction.mode, DecisionMode::DirectLabel);
        }
    }

    #[test]
    fn batch_appends_result_columns() {
        let p = predictor();
        let table =
            Table::from_csv_str("id,radius_mean,area_mean\n1,14.0,650\n2,7.0,300\n").unwrap();

        let outcome = p.run_batch(&table, Threshold::default()).unwrap();
        let out = outcome.to_table(false).unwrap();

        assert_eq!(
            out.headers(),
            &[
                "id",
                "radius_mean",
                "area_mean",
                PREDICTION_COLUMN,
                BENIGN_COLUMN,
                MALIGNANT_COLUMN,
            ]
        );
        assert_eq!(out.rows()[0][3..], ["Malignant", "50.00", "50.00"]);
        assert_eq!(out.rows()[1][3], "Benign");
        assert_eq!(out.rows()[1][0], "2");
    }

    #[test]
    fn batch_borderline_column_is_optional() {
        let p = predictor();
        // radius 16.1 scales to 0.6 -> p ~= 0.646, inside the band
        let table = Table::from_csv_str("radius_mean,area_mean\n16.1,650\n0,0\n").unwrap();

        let outcome = p.run_batch(&table, Threshold::default()).unwrap();
        let out = outcome.to_table(true).unwrap();
        assert_eq!(out.headers().last().unwrap(), BORDERLINE_COLUMN);
        assert_eq!(out.rows()[0].last().unwrap(), "yes");
        assert_eq!(out.rows()[1].last().unwrap(), "");

        let summary = outcome.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.borderline, 1);
        assert_eq!(summary.malignant, 1);
        assert_eq!(summary.benign, 1);
    }

    #[test]
    fn batch_missing_columns_rejects_whole_table() {
        let p = predictor();
        let table = Table::from_csv_str("id,texture_mean\n1,10\n").unwrap();

        match p.run_batch(&table, Threshold::default()) {
            Err(LumpError::MissingFeatures { missing }) => {
                assert_eq!(missing, vec!["radius_mean", "area_mean"]);
            }
            other => panic!("expected MissingFeatures, got {other:?}"),
        }
    }

    #[test]
    fn batch_bad_cell_rejects_whole_table() {
        let p = predictor();
        let table = Table::from_csv_str("radius_mean,area_mean\n14,650\nn/a,650\n").unwrap();

        let err = p.run_batch(&table, Threshold::default()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn batch_rejects_non_finite_cells_in_label_only_mode() {
        let p = Predictor::new(scaler(), Classifier::LabelOnly(Box::new(AlwaysBenign)));

        for cell in ["NaN", "inf", "-inf"] {
            let csv = format!("radius_mean,area_mean\n14,650\n{cell},650\n");
            let table = Table::from_csv_str(&csv).unwrap();

            let err = p.run_batch(&table, Threshold::default()).unwrap_err();
            assert!(matches!(err, LumpError::MalformedFile { .. }), "{cell}: {err}");
            assert!(err.to_string().contains("row 2"));
            assert!(err.to_string().contains("column 'radius_mean'"));
        }
    }

    #[test]
    fn manual_non_finite_value_is_rejected_before_the_model() {
        let p = Predictor::new(scaler(), Classifier::LabelOnly(Box::new(AlwaysBenign)));
        let mut entries = BTreeMap::new();
        entries.insert("area_mean".to_string(), f64::NAN);

        let err = p.predict_manual(&entries, Threshold::default()).unwrap_err();
        assert!(matches!(err, LumpError::MalformedFile { .. }));
    }

    #[test]
    fn batch_scaling_matches_single_prediction() {
        let p = predictor();
        let table = Table::from_csv_str("radius_mean,area_mean\n16.1,650\n9.3,410\n").unwrap();
        let outcome = p.run_batch(&table, Threshold::default()).unwrap();

        for (i, (radius, area)) in [(16.1, 650.0), (9.3, 410.0)].into_iter().enumerate() {
            let vector = FeatureVector::from_pairs([("radius_mean", radius), ("area_mean", area)]);
            let single = p.predict(&vector, Threshold::default()).unwrap();
            assert_eq!(outcome.predictions()[i], single);
        }
    }

    #[test]
    fn empty_batch_is_valid() {
        let p = predictor();
        let table = Table::from_csv_str("radius_mean,area_mean\n").unwrap();

        let outcome = p.run_batch(&table, Threshold::default()).unwrap();
        assert_eq!(outcome.summary().total, 0);
        assert_eq!(outcome.to_table(true).unwrap().headers().len(), 6);
    }

    #[test]
    fn predictor_config_deserializes_with_default_io() {
        let config: PredictorConfig =
            serde_json::from_str(r#"{"model_path": "m.onnx", "scaler_path": "s.json"}"#).unwrap();
        assert_eq!(config.io, ModelIo::default());
    }

    #[test]
    fn predictor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Predictor>();
    }
}
