//! Classifier adapters: ONNX model loading and inference via the `ort` crate.
//!
//! A classifier either exposes class probabilities or only a hard label.
//! The two capabilities are separate traits and the [`Classifier`] enum
//! records which one a loaded model has, so callers pick the decision mode
//! explicitly instead of probing the model.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tracing::debug;

use crate::decision::{DecisionMode, Label, ProbabilityPair};
use crate::error::{LumpError, Result};
use crate::scaler::ScaledVector;

pub trait ProbabilisticClassifier: Send + Sync {
    fn predict_proba(&self, input: &ScaledVector) -> Result<ProbabilityPair>;
}

pub trait LabelOnlyClassifier: Send + Sync {
    fn predict(&self, input: &ScaledVector) -> Result<Label>;
}

pub enum Classifier {
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    LabelOnly(Box<dyn LabelOnlyClassifier>),
}

impl Classifier {
    pub fn mode(&self) -> DecisionMode {
        match self {
            Classifier::Probabilistic(_) => DecisionMode::ProbabilityThreshold,
            Classifier::LabelOnly(_) => DecisionMode::DirectLabel,
        }
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Classifier").field(&self.mode()).finish()
    }
}

fn default_input() -> String {
    "float_input".to_string()
}

fn default_label_output() -> String {
    "output_label".to_string()
}

fn default_probability_output() -> Option<String> {
    Some("output_probability".to_string())
}

/// Tensor names of an exported scikit-learn classifier.
///
/// Defaults follow `skl2onnx` naming. The model must be exported with
/// `zipmap=False` so probabilities come out as a float `[N, 2]` tensor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelIo {
    #[serde(default = "default_input")]
    pub input: String,
    #[serde(default = "default_label_output")]
    pub label_output: String,
    /// `None` means the model only predicts labels.
    #[serde(default = "default_probability_output")]
    pub probability_output: Option<String>,
}

impl Default for ModelIo {
    fn default() -> Self {
        Self {
            input: default_input(),
            label_output: default_label_output(),
            probability_output: default_probability_output(),
        }
    }
}

impl ModelIo {
    pub fn label_only(mut self) -> Self {
        self.probability_output = None;
        self
    }
}

pub struct OnnxModel {
    session: Mutex<Session>,
    io: ModelIo,
}

impl OnnxModel {
    /// Load an ONNX model from the given path.
    pub fn load(model_path: &Path, io: ModelIo) -> Result<Self> {
        if !model_path.exists() {
            return Err(LumpError::artifact(model_path, "model file not found"));
        }

        let session = Session::builder()
            .map_err(|e| LumpError::artifact(model_path, e))?
            .with_intra_threads(1)
            .map_err(|e| LumpError::artifact(model_path, e))?
            .commit_from_file(model_path)
            .map_err(|e| LumpError::artifact(model_path, e))?;

        debug!(
            path = %model_path.display(),
            input = %io.input,
            probabilities = io.probability_output.is_some(),
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            io,
        })
    }

    pub fn io(&self) -> &ModelIo {
        &self.io
    }

    fn input_tensor(input: &ScaledVector) -> Result<Tensor<f32>> {
        let data = to_f32(input.values())?;
        Tensor::from_array((vec![1i64, data.len() as i64], data))
            .map_err(|e| LumpError::inference(format!("tensor creation error: {e}")))
    }
}

impl ProbabilisticClassifier for OnnxModel {
    fn predict_proba(&self, input: &ScaledVector) -> Result<ProbabilityPair> {
        let output_name = self.io.probability_output.as_deref().ok_or_else(|| {
            LumpError::inference("model was loaded without a probability output")
        })?;
        let tensor = Self::input_tensor(input)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| LumpError::inference(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.io.input.as_str() => tensor])
            .map_err(LumpError::inference)?;

        let output = outputs
            .get(output_name)
            .ok_or_else(|| LumpError::inference(format!("model has no output '{output_name}'")))?;
        let (_shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| LumpError::inference(format!("tensor extraction failed: {e}")))?;

        probabilities_from(data)
    }
}

impl LabelOnlyClassifier for OnnxModel {
    fn predict(&self, input: &ScaledVector) -> Result<Label> {
        let tensor = Self::input_tensor(input)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| LumpError::inference(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.io.input.as_str() => tensor])
            .map_err(LumpError::inference)?;

        let output = outputs.get(self.io.label_output.as_str()).ok_or_else(|| {
            LumpError::inference(format!("model has no output '{}'", self.io.label_output))
        })?;
        let (_shape, data) = output
            .try_extract_tensor::<i64>()
            .map_err(|e| LumpError::inference(format!("tensor extraction failed: {e}")))?;

        label_from(data)
    }
}

/// Read a `[1, 2]` probability row as (benign, malignant).
fn probabilities_from(data: &[f32]) -> Result<ProbabilityPair> {
    match data {
        [benign, malignant] => ProbabilityPair::new(f64::from(*benign), f64::from(*malignant)),
        _ => Err(LumpError::inference(format!(
            "expected 2 class probabilities, model returned {}",
            data.len()
        ))),
    }
}

fn label_from(data: &[i64]) -> Result<Label> {
    let class = data
        .first()
        .copied()
        .ok_or_else(|| LumpError::inference("model returned an empty label tensor"))?;
    Label::from_class(class)
}

/// Narrow scaled values to the model's `f32` input, refusing values that
/// would not survive the cast.
fn to_f32(values: &[f64]) -> Result<Vec<f32>> {
    values
        .iter()
        .enumerate()
        .map(|(pos, &v)| {
            let narrowed = v as f32;
            if narrowed.is_finite() {
                Ok(narrowed)
            } else {
                Err(LumpError::malformed(format!(
                    "scaled value {v} at position {pos} does not fit the model's f32 input"
                )))
            }
        })
        .collect()
}

/// Load a model and wrap it in the capability its I/O declares.
pub fn load_classifier(model_path: &Path, io: ModelIo) -> Result<Classifier> {
    let probabilistic = io.probability_output.is_some();
    let model = OnnxModel::load(model_path, io)?;

    Ok(if probabilistic {
        Classifier::Probabilistic(Box::new(model))
    } else {
        Classifier::LabelOnly(Box::new(model))
    })
}
