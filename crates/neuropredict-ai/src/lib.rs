//! Inference layer: model artifact bundles, input normalization, and
//! classifier backends (logistic regression, decision forests, ONNX Runtime).

mod bundle;
mod encoder;
mod engine;
mod error;
mod forest;
mod linear;
mod normalizer;
#[cfg(feature = "onnx")]
mod onnx;

pub use bundle::{Manifest, ModelBundle, ModelSpec};
pub use encoder::LabelEncoder;
pub use engine::{Classification, Classifier, InferenceEngine};
pub use error::{BundleError, PredictError};
pub use forest::{DecisionTree, RandomForest};
pub use linear::{LogisticModel, StandardScaler};
pub use normalizer::{EncodedVector, normalize};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
