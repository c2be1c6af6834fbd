//! Model artifact bundle: classifier, trained feature order, and encoders.
//!
//! The artifact is a JSON manifest:
//!
//! ```json
//! {
//!   "features": ["Age", "Gender", ...],
//!   "encoders": { "Gender": { "classes": ["0", "1"] } },
//!   "model": { "type": "logistic", "coefficients": [...], "intercept": -0.6 }
//! }
//! ```
//!
//! `model.type` is one of `logistic`, `forest`, or `onnx`. ONNX models are
//! referenced by a path relative to the manifest and need the `onnx` feature.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::encoder::LabelEncoder;
use crate::engine::Classifier;
use crate::error::BundleError;
use crate::forest::RandomForest;
use crate::linear::LogisticModel;

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub features: Vec<String>,
    #[serde(default)]
    pub encoders: HashMap<String, LabelEncoder>,
    pub model: ModelSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Logistic(LogisticModel),
    Forest(RandomForest),
    Onnx { path: PathBuf },
}

/// The loaded, validated artifact. Read-only after construction.
pub struct ModelBundle {
    classifier: Box<dyn Classifier>,
    features: Vec<String>,
    encoders: HashMap<String, LabelEncoder>,
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("features", &self.features)
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ModelBundle {
    /// Read and validate the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        if !path.exists() {
            return Err(BundleError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&text)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_manifest(manifest, base_dir)
    }

    /// Build a bundle from an already-parsed manifest. Relative ONNX paths are
    /// resolved against `base_dir`.
    pub fn from_manifest(manifest: Manifest, base_dir: &Path) -> Result<Self, BundleError> {
        let n = manifest.features.len();
        let classifier: Box<dyn Classifier> = match manifest.model {
            ModelSpec::Logistic(model) => {
                model.validate(n).map_err(BundleError::Invalid)?;
                Box::new(model)
            }
            ModelSpec::Forest(forest) => {
                forest.validate(n).map_err(BundleError::Invalid)?;
                Box::new(forest)
            }
            ModelSpec::Onnx { path } => load_onnx(&base_dir.join(path), n)?,
        };
        Self::new(classifier, manifest.features, manifest.encoders)
    }

    /// Assemble a bundle, checking that the feature list, encoders, and
    /// classifier agree with each other.
    pub fn new(
        classifier: Box<dyn Classifier>,
        features: Vec<String>,
        encoders: HashMap<String, LabelEncoder>,
    ) -> Result<Self, BundleError> {
        if features.is_empty() {
            return Err(BundleError::Invalid("feature list is empty".into()));
        }

        let mut seen = HashSet::with_capacity(features.len());
        for name in &features {
            if !seen.insert(name.as_str()) {
                return Err(BundleError::Invalid(format!(
                    "feature '{name}' listed more than once"
                )));
            }
        }

        for (name, encoder) in &encoders {
            if !seen.contains(name.as_str()) {
                return Err(BundleError::Invalid(format!(
                    "encoder for '{name}' which is not a model feature"
                )));
            }
            if encoder.classes.is_empty() {
                return Err(BundleError::Invalid(format!("encoder for '{name}' has no classes")));
            }
            if let Some(dup) = encoder.duplicate_class() {
                return Err(BundleError::Invalid(format!(
                    "encoder for '{name}' repeats class '{dup}'"
                )));
            }
        }

        classifier.check().map_err(BundleError::Invalid)?;
        if classifier.n_features() != features.len() {
            return Err(BundleError::Invalid(format!(
                "classifier expects {} features, manifest lists {}",
                classifier.n_features(),
                features.len()
            )));
        }

        Ok(Self {
            classifier,
            features,
            encoders,
        })
    }

    /// Trained column order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn encoders(&self) -> &HashMap<String, LabelEncoder> {
        &self.encoders
    }

    pub fn encoder(&self, feature: &str) -> Option<&LabelEncoder> {
        self.encoders.get(feature)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path, n_features: usize) -> Result<Box<dyn Classifier>, BundleError> {
    if !path.exists() {
        return Err(BundleError::NotFound(path.to_path_buf()));
    }
    Ok(Box::new(crate::onnx::OnnxClassifier::load(path, n_features)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path, _n_features: usize) -> Result<Box<dyn Classifier>, BundleError> {
    Err(BundleError::Invalid(format!(
        "{} is an ONNX model; rebuild with the `onnx` feature to load it",
        path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ModelBundle, BundleError> {
        let manifest: Manifest = serde_json::from_str(json)?;
        ModelBundle::from_manifest(manifest, Path::new("."))
    }

    #[test]
    fn loads_fixture() {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/logistic_bundle.json");
        let bundle = ModelBundle::load(&path).unwrap();
        assert_eq!(bundle.features().len(), 32);
        assert_eq!(bundle.features()[0], "Age");
        assert!(bundle.encoder("Gender").is_some());
        assert!(bundle.encoder("Age").is_none());
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = ModelBundle::load(Path::new("/no/such/model.json")).unwrap_err();
        assert!(matches!(err, BundleError::NotFound(_)));
    }

    #[test]
    fn parses_forest_manifest() {
        let bundle = parse(
            r#"{
                "features": ["Age"],
                "model": {
                    "type": "forest",
                    "n_features": 1,
                    "trees": [{
                        "children_left": [1, -1, -1],
                        "children_right": [2, -1, -1],
                        "feature": [0, -2, -2],
                        "threshold": [75.0, -2.0, -2.0],
                        "value": [[10, 10], [8, 2], [2, 8]]
                    }]
                }
            }"#,
        )
        .unwrap();
        let out = bundle.classifier().classify(&[80.0]).unwrap();
        assert_eq!(out.label, 1);
        assert!(bundle.encoders().is_empty());
    }

    #[test]
    fn rejects_width_mismatch() {
        let err = parse(
            r#"{
                "features": ["Age", "BMI"],
                "model": {"type": "logistic", "coefficients": [1.0], "intercept": 0.0}
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, BundleError::Invalid(_)));
    }

    #[test]
    fn rejects_duplicate_features() {
        let err = parse(
            r#"{
                "features": ["Age", "Age"],
                "model": {"type": "logistic", "coefficients": [1.0, 1.0], "intercept": 0.0}
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_encoder_for_unknown_feature() {
        let err = parse(
            r#"{
                "features": ["Age"],
                "encoders": {"Gender": {"classes": ["0", "1"]}},
                "model": {"type": "logistic", "coefficients": [1.0], "intercept": 0.0}
            }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Gender"));
    }

    #[test]
    fn new_checks_classifier_structure() {
        let forest = RandomForest {
            n_features: 1,
            trees: vec![crate::forest::DecisionTree {
                children_left: vec![5],
                children_right: vec![5],
                feature: vec![0],
                threshold: vec![0.0],
                value: vec![[1.0, 1.0]],
            }],
        };
        let err = ModelBundle::new(Box::new(forest), vec!["Age".into()], HashMap::new())
            .unwrap_err();
        assert!(matches!(err, BundleError::Invalid(_)));
        assert!(err.to_string().contains("invalid child 5"));
    }

    #[test]
    fn rejects_unknown_model_type() {
        let err = parse(r#"{"features": ["Age"], "model": {"type": "svm"}}"#).unwrap_err();
        assert!(matches!(err, BundleError::Json(_)));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn onnx_requires_feature() {
        let err = parse(r#"{"features": ["Age"], "model": {"type": "onnx", "path": "m.onnx"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("onnx"));
    }
}
