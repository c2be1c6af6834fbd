//! Logistic regression backend with an optional standard-scaler stage.

use serde::{Deserialize, Serialize};

use crate::engine::{Classification, Classifier};

fn default_threshold() -> f64 {
    0.5
}

/// Per-feature standardisation applied before the linear term:
/// `(x - mean) / scale`. A zero scale leaves the centred value unscaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    fn apply(&self, idx: usize, x: f64) -> f64 {
        let scale = self.scale[idx];
        let centred = x - self.mean[idx];
        if scale == 0.0 { centred } else { centred / scale }
    }
}

/// Binary logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    /// Positive-class probability above which the label is 1.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            scaler: None,
            threshold: default_threshold(),
        }
    }

    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    /// Check internal consistency against the bundle's feature count.
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.coefficients.len() != n_features {
            return Err(format!(
                "logistic model has {} coefficients for {n_features} features",
                self.coefficients.len()
            ));
        }
        if let Some(scaler) = &self.scaler
            && (scaler.mean.len() != n_features || scaler.scale.len() != n_features)
        {
            return Err(format!(
                "scaler has {} means and {} scales for {n_features} features",
                scaler.mean.len(),
                scaler.scale.len()
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!("threshold {} outside [0, 1]", self.threshold));
        }
        Ok(())
    }

    /// Linear term `intercept + w · x'` where `x'` is the scaled row.
    fn decision_function(&self, row: &[f64]) -> f64 {
        let dot: f64 = self
            .coefficients
            .iter()
            .zip(row)
            .enumerate()
            .map(|(i, (w, &x))| {
                let x = match &self.scaler {
                    Some(s) => s.apply(i, x),
                    None => x,
                };
                w * x
            })
            .sum();
        self.intercept + dot
    }
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn check(&self) -> Result<(), String> {
        self.validate(self.coefficients.len())
    }

    fn classify(&self, row: &[f64]) -> anyhow::Result<Classification> {
        anyhow::ensure!(
            row.len() == self.coefficients.len(),
            "X has {} features, but the logistic model expects {}",
            row.len(),
            self.coefficients.len()
        );
        let z = self.decision_function(row);
        anyhow::ensure!(z.is_finite(), "decision function is not finite: {z}");

        let p = sigmoid(z);
        Ok(Classification {
            label: u8::from(p > self.threshold),
            positive_probability: p,
        })
    }
}

/// Logistic function without overflow for large |z|.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
