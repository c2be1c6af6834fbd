//! Inference engine: the loaded-once model bundle and the predict operation.

use std::path::Path;

use neuropredict_core::{PredictionResult, Submission};
use tracing::{error, info};

use crate::bundle::ModelBundle;
use crate::error::PredictError;
use crate::normalizer::{self, EncodedVector};

/// Raw output of a classifier for one row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: u8,
    /// Probability of class index 1.
    pub positive_probability: f64,
}

/// A trained binary classifier over a fixed-width numeric row.
///
/// Implementations are read-only after construction and may be shared across
/// threads.
pub trait Classifier: Send + Sync {
    /// Width of the rows the classifier was trained on.
    fn n_features(&self) -> usize;

    /// Structural consistency of the trained parameters. Called once when a
    /// bundle is assembled.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    /// Discrete label and positive-class probability for one row.
    fn classify(&self, row: &[f64]) -> anyhow::Result<Classification>;
}

enum EngineState {
    Ready(ModelBundle),
    Unavailable { reason: String },
}

/// Handle to the classifier artifact bundle.
///
/// Constructed once at startup and never reloaded. If loading fails the engine
/// stays permanently unavailable and every call fails fast with
/// [`PredictError::ModelUnavailable`].
pub struct InferenceEngine {
    state: EngineState,
}

impl InferenceEngine {
    /// Load the bundle at `path`. Never fails; see [`Self::is_loaded`].
    pub fn load(path: &Path) -> Self {
        match ModelBundle::load(path) {
            Ok(bundle) => {
                info!(
                    path = %path.display(),
                    features = bundle.features().len(),
                    encoders = bundle.encoders().len(),
                    "model loaded"
                );
                Self::from_bundle(bundle)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "model load failed, predictions disabled");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn from_bundle(bundle: ModelBundle) -> Self {
        Self {
            state: EngineState::Ready(bundle),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: EngineState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, EngineState::Ready(_))
    }

    /// Why the model could not be loaded, if it could not.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            EngineState::Ready(_) => None,
            EngineState::Unavailable { reason } => Some(reason),
        }
    }

    /// The model's trained column order. Empty when unavailable.
    pub fn feature_names(&self) -> &[String] {
        match &self.state {
            EngineState::Ready(bundle) => bundle.features(),
            EngineState::Unavailable { .. } => &[],
        }
    }

    fn bundle(&self) -> Result<&ModelBundle, PredictError> {
        match &self.state {
            EngineState::Ready(bundle) => Ok(bundle),
            EngineState::Unavailable { reason } => {
                Err(PredictError::ModelUnavailable(reason.clone()))
            }
        }
    }

    /// Encode a submission into the model's feature vector.
    pub fn normalize(&self, submission: &Submission) -> Result<EncodedVector, PredictError> {
        normalizer::normalize(self.bundle()?, submission)
    }

    /// Classify an encoded vector.
    pub fn predict(&self, encoded: &EncodedVector) -> Result<PredictionResult, PredictError> {
        let bundle = self.bundle()?;

        let expected = bundle.features().len();
        if encoded.len() != expected {
            return Err(PredictError::Inference(format!(
                "expected {expected} features, got {}",
                encoded.len()
            )));
        }

        let out = bundle
            .classifier()
            .classify(encoded.as_slice())
            .map_err(|e| PredictError::Inference(format!("{e:#}")))?;

        if out.label > 1 {
            return Err(PredictError::Inference(format!(
                "classifier returned label {}",
                out.label
            )));
        }
        let p = out.positive_probability;
        if !p.is_finite() || !(-1e-9..=1.0 + 1e-9).contains(&p) {
            return Err(PredictError::Inference(format!(
                "classifier returned probability {p}"
            )));
        }

        Ok(PredictionResult::new(out.label, p))
    }

    /// Normalize then predict.
    pub fn score(&self, submission: &Submission) -> Result<PredictionResult, PredictError> {
        let encoded = self.normalize(submission)?;
        self.predict(&encoded)
    }
}
