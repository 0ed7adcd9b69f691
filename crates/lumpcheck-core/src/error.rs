//! Error taxonomy shared by every stage of the pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LumpError>;

#[derive(Debug, Error)]
pub enum LumpError {
    /// Scaler or model artifact could not be loaded. Fatal at startup.
    #[error("cannot load artifact {}: {reason}", path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    /// Required feature columns are absent from an input table.
    #[error("missing required feature columns: {}", missing.join(", "))]
    MissingFeatures { missing: Vec<String> },

    #[error("malformed input file: {reason}")]
    MalformedFile { reason: String },

    #[error("feature vector does not match the fitted scaler (expected {expected} features, got {actual}): {detail}")]
    TransformArity {
        expected: usize,
        actual: usize,
        detail: String,
    },

    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("inference failed: {reason}")]
    Inference { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LumpError {
    pub fn artifact(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        LumpError::ArtifactLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(reason: impl ToString) -> Self {
        LumpError::MalformedFile {
            reason: reason.to_string(),
        }
    }

    pub fn inference(reason: impl ToString) -> Self {
        LumpError::Inference {
            reason: reason.to_string(),
        }
    }

    /// True for errors that leave the process unable to serve any prediction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LumpError::ArtifactLoad { .. })
    }
}

impl From<csv::Error> for LumpError {
    fn from(err: csv::Error) -> Self {
        LumpError::malformed(err)
    }
}

impl From<calamine::Error> for LumpError {
    fn from(err: calamine::Error) -> Self {
        LumpError::malformed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_features_lists_every_name() {
        let err = LumpError::MissingFeatures {
            missing: vec!["radius_mean".into(), "area_worst".into()],
        };
        assert_eq!(
            err.to_string(),
            "missing required feature columns: radius_mean, area_worst"
        );
    }

    #[test]
    fn only_artifact_errors_are_fatal() {
        assert!(LumpError::artifact("/tmp/model.onnx", "not found").is_fatal());
        assert!(!LumpError::malformed("bad utf-8").is_fatal());
        assert!(!LumpError::InvalidThreshold(1.5).is_fatal());
        assert!(!LumpError::MissingFeatures { missing: vec![] }.is_fatal());
    }

    #[test]
    fn artifact_error_names_the_path() {
        let err = LumpError::artifact("/models/scaler.json", "expected value at line 1");
        let msg = err.to_string();
        assert!(msg.contains("/models/scaler.json"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LumpError>();
    }
}
