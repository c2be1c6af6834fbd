use std::path::PathBuf;

use neuropredict_core::SubmissionError;
use thiserror::Error;

/// Failures on the submit → normalize → predict path.
#[derive(Debug, Error)]
pub enum PredictError {
    /// Startup load failed; every prediction is refused.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// A submitted value could not be encoded for `field`.
    #[error("Error encoding {field}: {reason}")]
    Encoding { field: String, reason: String },

    /// Numerical or shape failure inside the classifier call.
    #[error("Prediction Error: {0}")]
    Inference(String),

    #[error("malformed submission: {0}")]
    MalformedSubmission(#[from] SubmissionError),
}

/// Failures while loading a model artifact bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid model manifest: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(String),
}
