//! Feature schema and vector assembly.
//!
//! The schema is the ordered list of measurement names the scaler and model
//! were fitted against. Every vector handed downstream is built through it,
//! either from manual entry (permissive, missing values default to 0.0) or
//! from a table row (strict, every required column must be present).

use std::collections::{BTreeMap, HashSet};

use crate::error::{LumpError, Result};

/// The ten most informative WDBC measurements, in the order the reduced
/// model was fitted with.
pub const TOP_TEN_FEATURES: [&str; 10] = [
    "concave points_worst",
    "concave points_mean",
    "radius_worst",
    "perimeter_mean",
    "area_worst",
    "area_mean",
    "radius_mean",
    "perimeter_worst",
    "concavity_mean",
    "concavity_worst",
];

/// The complete 30-measurement WDBC layout.
pub const ALL_FEATURES: [&str; 30] = [
    "radius_mean",
    "texture_mean",
    "perimeter_mean",
    "area_mean",
    "smoothness_mean",
    "compactness_mean",
    "concavity_mean",
    "concave points_mean",
    "symmetry_mean",
    "fractal_dimension_mean",
    "radius_se",
    "texture_se",
    "perimeter_se",
    "area_se",
    "smoothness_se",
    "compactness_se",
    "concavity_se",
    "concave points_se",
    "symmetry_se",
    "fractal_dimension_se",
    "radius_worst",
    "texture_worst",
    "perimeter_worst",
    "area_worst",
    "smoothness_worst",
    "compactness_worst",
    "concavity_worst",
    "concave points_worst",
    "symmetry_worst",
    "fractal_dimension_worst",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Build a schema from an ordered name list. Empty lists and duplicate
    /// names are rejected since neither can match a fitted artifact.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(LumpError::malformed("feature schema is empty"));
        }

        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(LumpError::malformed(format!(
                    "feature '{name}' appears more than once in the schema"
                )));
            }
        }

        Ok(Self { names })
    }

    pub fn top_ten() -> Self {
        Self {
            names: TOP_TEN_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn all() -> Self {
        Self {
            names: ALL_FEATURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Assemble a vector from manually entered values. Never fails: features
    /// without an entry are 0.0 and keys outside the schema are ignored.
    pub fn build_manual(&self, entries: &BTreeMap<String, f64>) -> FeatureVector {
        let values = self
            .names
            .iter()
            .map(|name| entries.get(name).copied().unwrap_or(0.0))
            .collect();

        FeatureVector {
            names: self.names.clone(),
            values,
        }
    }

    /// Resolve the column index of every required feature, in schema order.
    ///
    /// Fails with the complete list of absent names, not just the first.
    pub fn locate(&self, headers: &[String]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(self.names.len());
        let mut missing = Vec::new();

        for name in &self.names {
            match headers.iter().position(|h| h == name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.clone()),
            }
        }

        if !missing.is_empty() {
            return Err(LumpError::MissingFeatures { missing });
        }
        Ok(indices)
    }

    /// Assemble a vector from one table row using indices from [`locate`].
    ///
    /// `row_number` is 1-based and only used in error messages.
    ///
    /// [`locate`]: FeatureSchema::locate
    pub fn build_row(
        &self,
        row: &[String],
        indices: &[usize],
        row_number: usize,
    ) -> Result<FeatureVector> {
        let mut values = Vec::with_capacity(indices.len());

        for (name, &idx) in self.names.iter().zip(indices) {
            let raw = row.get(idx).map(|s| s.trim()).unwrap_or("");
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    LumpError::malformed(format!(
                        "row {row_number}, column '{name}': '{raw}' is not a finite number"
                    ))
                })?;
            values.push(value);
        }

        Ok(FeatureVector {
            names: self.names.clone(),
            values,
        })
    }
}

/// Ordered, named measurements ready for scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Pair names with values directly, keeping the given order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<f64>) =
            pairs.into_iter().map(|(n, v)| (n.into(), v)).unzip();
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
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

    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }
}

/// Human-readable label for a feature name: underscores become spaces and
/// each word is capitalised (`concave points_worst` -> `Concave Points Worst`).
pub fn display_label(name: &str) -> String {
    name.replace('_', " ")
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
