//! Fitted standard-scaler artifact.
//!
//! The artifact is a JSON export of a fitted scikit-learn `StandardScaler`:
//!
//! ```json
//! { "feature_names": ["radius_mean", ...], "mean": [14.1, ...], "scale": [3.5, ...] }
//! ```
//!
//! `feature_names` is the authoritative feature order for the whole
//! pipeline. Applying the artifact computes `(x - mean) / scale` per feature.

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2, Axis};
use serde::Deserialize;
use tracing::debug;

use crate::error::{LumpError, Result};
use crate::features::{FeatureSchema, FeatureVector};

#[derive(Debug, Clone, Deserialize)]
struct ScalerArtifact {
    feature_names: Vec<String>,
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct StandardScaler {
    schema: FeatureSchema,
    mean: Array1<f64>,
    scale: Array1<f64>,
}

/// A feature vector after scaling. Same length and order as its input.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledVector {
    values: Vec<f64>,
}

impl ScaledVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl StandardScaler {
    /// Load the scaler artifact. Any failure here is fatal to startup.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| LumpError::artifact(path, e))?;
        let artifact: ScalerArtifact =
            serde_json::from_str(&data).map_err(|e| LumpError::artifact(path, e))?;

        let scaler = Self::from_parts(artifact.feature_names, artifact.mean, artifact.scale)
            .map_err(|e| LumpError::artifact(path, e))?;

        debug!(
            path = %path.display(),
            features = scaler.schema.len(),
            "scaler artifact loaded"
        );
        Ok(scaler)
    }

    /// Build a scaler from already-fitted statistics.
    pub fn from_parts(feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let schema = FeatureSchema::new(feature_names)?;

        if mean.len() != schema.len() || scale.len() != schema.len() {
            return Err(LumpError::malformed(format!(
                "scaler has {} feature names, {} means and {} scales",
                schema.len(),
                mean.len(),
                scale.len()
            )));
        }
        if let Some(pos) = mean.iter().position(|m| !m.is_finite()) {
            return Err(LumpError::malformed(format!(
                "mean for '{}' is not finite",
                schema.names()[pos]
            )));
        }
        if let Some(pos) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(LumpError::malformed(format!(
                "scale for '{}' must be finite and non-zero",
                schema.names()[pos]
            )));
        }

        Ok(Self {
            schema,
            mean: Array1::from(mean),
            scale: Array1::from(scale),
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn n_features(&self) -> usize {
        self.schema.len()
    }

    /// Scale one vector. Its names must match the fitted order exactly and
    /// every value, before and after scaling, must be finite.
    pub fn transform(&self, vector: &FeatureVector) -> Result<ScaledVector> {
        self.check_names(vector)?;
        self.check_finite(vector.values(), "value")?;

        let values: Vec<f64> = vector
            .values()
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&m, &s))| (x - m) / s)
            .collect();
        self.check_finite(&values, "scaled value")?;

        Ok(ScaledVector { values })
    }

    /// Scale a matrix (rows = samples, columns in fitted order).
    ///
    /// Non-finite input or output is rejected with the 1-based row number.
    pub fn transform_batch(&self, features: Array2<f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.n_features() {
            return Err(LumpError::TransformArity {
                expected: self.n_features(),
                actual: features.ncols(),
                detail: "column count differs from the fitted scaler".to_string(),
            });
        }

        let mut scaled = features;
        for (i, mut row) in scaled.axis_iter_mut(Axis(0)).enumerate() {
            if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
                return Err(self.non_finite(pos, "value", Some(i + 1)));
            }
            row -= &self.mean;
            row /= &self.scale;
            if let Some(pos) = row.iter().position(|v| !v.is_finite()) {
                return Err(self.non_finite(pos, "scaled value", Some(i + 1)));
            }
        }
        Ok(scaled)
    }

    fn check_finite(&self, values: &[f64], what: &str) -> Result<()> {
        match values.iter().position(|v| !v.is_finite()) {
            Some(pos) => Err(self.non_finite(pos, what, None)),
            None => Ok(()),
        }
    }

    fn non_finite(&self, pos: usize, what: &str, row: Option<usize>) -> LumpError {
        let name = &self.schema.names()[pos];
        match row {
            Some(row) => {
                LumpError::malformed(format!("row {row}: {what} for '{name}' is not finite"))
            }
            None => LumpError::malformed(format!("{what} for '{name}' is not finite")),
        }
    }

    fn check_names(&self, vector: &FeatureVector) -> Result<()> {
        let expected = self.schema.names();
        let actual = vector.names();

        if expected.len() != actual.len() {
            return Err(LumpError::TransformArity {
                expected: expected.len(),
                actual: actual.len(),
                detail: "feature count differs from the fitted scaler".to_string(),
            });
        }

        if let Some(pos) = expected.iter().zip(actual).position(|(e, a)| e != a) {
            return Err(LumpError::TransformArity {
                expected: expected.len(),
                actual: actual.len(),
                detail: format!(
                    "position {pos} holds '{}' but the scaler was fitted with '{}'",
                    actual[pos], expected[pos]
                ),
            });
        }
        Ok(())
    }
}
