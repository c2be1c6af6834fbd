//! Fitted categorical encoders shipped with the model bundle.

use serde::{Deserialize, Serialize};

/// Label encoder: an ordered list of the classes seen during training.
/// The code of a class is its position in that list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Encode one raw value. Unknown values are an error.
    pub fn transform(&self, value: &str) -> Result<f64, String> {
        self.classes
            .iter()
            .position(|c| c == value)
            .map(|idx| idx as f64)
            .ok_or_else(|| format!("y contains previously unseen labels: '{value}'"))
    }

    /// Class for a code, if the code is in range.
    pub fn inverse_transform(&self, code: f64) -> Option<&str> {
        if !code.is_finite() || code < 0.0 || code.fract() != 0.0 {
            return None;
        }
        self.classes.get(code as usize).map(String::as_str)
    }

    pub(crate) fn duplicate_class(&self) -> Option<&str> {
        self.classes
            .iter()
            .enumerate()
            .find(|(i, c)| self.classes[..*i].contains(c))
            .map(|(_, c)| c.as_str())
    }
}
