//! lumpcheck-core — shared library for breast-lump classification.
//!
//! Loads a fitted scaler and ONNX classifier once, assembles feature vectors
//! from manual entry or tabular rows, applies the threshold decision, and
//! formats results for the CLI.

pub mod decision;
pub mod error;
pub mod features;
pub mod guide;
pub mod inference;
pub mod pipeline;
pub mod report;
pub mod scaler;
pub mod table;

pub use decision::{DecisionMode, Label, Prediction, ProbabilityPair, Threshold};
pub use error::{LumpError, Result};
pub use features::{FeatureSchema, FeatureVector};
pub use inference::{Classifier, LabelOnlyClassifier, ModelIo, ProbabilisticClassifier};
pub use pipeline::{BatchOutcome, BatchSummary, Predictor, PredictorConfig};
pub use scaler::{ScaledVector, StandardScaler};
pub use table::Table;
