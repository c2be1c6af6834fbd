//! ONNX Runtime backend for classifiers exported to ONNX.
//!
//! The graph must take a single `[1, n_features]` float input and produce the
//! predicted label (int64) as output 0 and a `[1, 2]` float probability tensor
//! as output 1. Exporters that wrap probabilities in a sequence of maps must
//! have that wrapping disabled.

use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::engine::{Classification, Classifier};
use crate::error::BundleError;

pub struct OnnxClassifier {
    // A run needs exclusive access to the session.
    session: Mutex<Session>,
    input_name: String,
    n_features: usize,
}

impl OnnxClassifier {
    pub fn load(path: &Path, n_features: usize) -> Result<Self, BundleError> {
        let session = Session::builder()
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| BundleError::Onnx(e.to_string()))?;

        if session.outputs().len() < 2 {
            return Err(BundleError::Invalid(format!(
                "{} has {} outputs, expected label and probabilities",
                path.display(),
                session.outputs().len()
            )));
        }
        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| BundleError::Invalid(format!("{} has no inputs", path.display())))?;

        info!(model = %path.display(), input = %input_name, n_features, "loaded onnx classifier");
        Ok(Self {
            session: Mutex::new(session),
            input_name,
            n_features,
        })
    }
}

/// Column 1 of the first row of a `[rows, 2]` probability tensor.
fn positive_probability(dims: &[i64], proba: &[f32]) -> anyhow::Result<f64> {
    anyhow::ensure!(
        dims.len() == 2 && dims[0] >= 1 && dims[1] == 2 && proba.len() >= 2,
        "unexpected probability shape: {dims:?}, expected [1, 2]"
    );
    Ok(f64::from(proba[1]))
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classify(&self, row: &[f64]) -> anyhow::Result<Classification> {
        anyhow::ensure!(
            row.len() == self.n_features,
            "X has {} features, but the onnx model expects {}",
            row.len(),
            self.n_features
        );

        let data: Vec<f32> = row.iter().map(|&x| x as f32).collect();
        let shape = [1i64, self.n_features as i64];
        let input = Tensor::from_array((shape, data.into_boxed_slice()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("onnx session lock poisoned"))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input])?;

        let (_, labels) = outputs[0].try_extract_tensor::<i64>()?;
        let label = *labels
            .first()
            .ok_or_else(|| anyhow::anyhow!("empty label output"))?;

        let (proba_shape, proba) = outputs[1].try_extract_tensor::<f32>()?;
        let positive_probability = positive_probability(proba_shape, proba)?;

        anyhow::ensure!(label == 0 || label == 1, "onnx model returned label {label}");
        Ok(Classification {
            label: label as u8,
            positive_probability,
        })
    }
}
