//! Raw form values → the numeric row the model was trained on.

use std::collections::HashMap;

use neuropredict_core::{RawValue, Submission};
use tracing::{debug, warn};

use crate::bundle::ModelBundle;
use crate::error::PredictError;

/// Feature row in the model's trained column order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedVector {
    values: Vec<f64>,
    filled: Vec<String>,
}

impl EncodedVector {
    pub fn new(values: Vec<f64>, filled: Vec<String>) -> Self {
        Self { values, filled }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Model features that were absent from the submission and set to 0.
    pub fn filled(&self) -> &[String] {
        &self.filled
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Encode `submission` for `bundle`'s classifier.
///
/// Fields with a fitted encoder are encoded from their textual form; all
/// others must be numeric. The result is projected onto the bundle's feature
/// order and features the submission lacks are set to 0.
pub fn normalize(bundle: &ModelBundle, submission: &Submission) -> Result<EncodedVector, PredictError> {
    let pairs = submission.pairs()?;

    let mut encoded: HashMap<&str, f64> = HashMap::with_capacity(pairs.len());
    for (field, value) in pairs {
        if value.is_null() {
            continue;
        }
        let code = match bundle.encoder(field) {
            Some(encoder) => encoder
                .transform(&value.to_string())
                .map_err(|reason| PredictError::Encoding {
                    field: field.to_string(),
                    reason,
                })?,
            None => numeric(field, value)?,
        };
        encoded.insert(field, code);
    }

    let mut values = Vec::with_capacity(bundle.features().len());
    let mut filled = Vec::new();
    for name in bundle.features() {
        match encoded.remove(name.as_str()) {
            Some(v) => values.push(v),
            None => {
                values.push(0.0);
                filled.push(name.clone());
            }
        }
    }

    if !filled.is_empty() {
        warn!(features = ?filled, "features missing from submission, filled with 0");
    }
    if !encoded.is_empty() {
        let ignored: Vec<&str> = encoded.keys().copied().collect();
        debug!(fields = ?ignored, "submitted fields unknown to the model were ignored");
    }

    Ok(EncodedVector { values, filled })
}

fn numeric(field: &str, value: &RawValue) -> Result<f64, PredictError> {
    match value.as_number() {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(PredictError::Encoding {
            field: field.to_string(),
            reason: format!("expected a number, got '{value}'"),
        }),
    }
}
