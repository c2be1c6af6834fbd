//! Raw form submissions as they arrive from the UI.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single value entered in the form.
///
/// Numeric widgets submit numbers, selects and radios submit option codes,
/// and cleared inputs submit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Null,
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric reading of the value. Text is parsed after trimming.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null => None,
        }
    }
}

impl fmt::Display for RawValue {
    /// Textual form handed to categorical encoders: `1.0` prints as `1`,
    /// `25.5` as `25.5`, text as-is.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s.trim()),
            Self::Null => f.write_str("None"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SubmissionError {
    #[error("submission carries {values} values but {fields} field identifiers")]
    LengthMismatch { values: usize, fields: usize },
    #[error("field '{0}' was submitted more than once")]
    DuplicateField(String),
}

/// One form submission: parallel sequences of values and the field each
/// value belongs to. Order is whatever the UI produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub values: Vec<RawValue>,
    pub fields: Vec<String>,
}

impl Submission {
    pub fn new(values: Vec<RawValue>, fields: Vec<String>) -> Self {
        Self { values, fields }
    }

    /// Build a submission from `(field, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        let (fields, values) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self { values, fields }
    }

    /// A submission with every schema feature at its declared default.
    pub fn defaults() -> Self {
        Self::from_pairs(crate::schema::features().map(|f| (f.name, f.default_value())))
    }

    /// Replace the value of `field`, appending it if absent.
    pub fn set(&mut self, field: &str, value: impl Into<RawValue>) {
        let value = value.into();
        match self
            .fields
            .iter()
            .position(|f| f == field)
            .and_then(|idx| self.values.get_mut(idx))
        {
            Some(slot) => *slot = value,
            None => {
                self.fields.push(field.to_string());
                self.values.push(value);
            }
        }
    }

    /// Drop `field` from the submission entirely.
    pub fn remove(&mut self, field: &str) {
        if let Some(idx) = self.fields.iter().position(|f| f == field) {
            self.fields.remove(idx);
            if idx < self.values.len() {
                self.values.remove(idx);
            }
        }
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields
            .iter()
            .position(|f| f == field)
            .and_then(|idx| self.values.get(idx))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Validated `(field, value)` pairs in submission order.
    ///
    /// Both sequences must have the same length and every field may appear
    /// at most once.
    pub fn pairs(&self) -> Result<Vec<(&str, &RawValue)>, SubmissionError> {
        if self.values.len() != self.fields.len() {
            return Err(SubmissionError::LengthMismatch {
                values: self.values.len(),
                fields: self.fields.len(),
            });
        }

        let mut seen = HashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if !seen.insert(field.as_str()) {
                return Err(SubmissionError::DuplicateField(field.clone()));
            }
        }

        Ok(self
            .fields
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
            .collect())
    }
}
