//! Human-readable view of a submission, for reports and chat context.
//!
//! Categorical codes are turned back into their option labels (`1` →
//! `"Female"`) using the feature schema. Numbers keep their value.

use serde::Serialize;
use tracing::debug;

use crate::schema;
use crate::submission::{RawValue, Submission};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadableField {
    pub name: String,
    pub label: String,
    pub value: String,
}

/// Ordered `(name, label, value)` entries: schema features first in display
/// order, then any submitted fields the schema does not know.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadableInput {
    pub fields: Vec<ReadableField>,
}

impl ReadableInput {
    pub fn iter(&self) -> impl Iterator<Item = &ReadableField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

/// Build the readable view of `submission`. Null values are skipped.
pub fn readable_input(submission: &Submission) -> ReadableInput {
    let mut fields = Vec::with_capacity(submission.len());

    for spec in schema::features() {
        let Some(value) = submission.get(spec.name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let text = match value.as_number().and_then(|n| spec.decode_value(n)) {
            Some(label) => label.to_string(),
            None => value.to_string(),
        };
        fields.push(ReadableField {
            name: spec.name.to_string(),
            label: spec.label.to_string(),
            value: text,
        });
    }

    for (name, value) in submission.fields.iter().zip(&submission.values) {
        if schema::find(name).is_some() || matches!(value, RawValue::Null) {
            continue;
        }
        debug!(field = %name, "field not in schema, reporting verbatim");
        fields.push(ReadableField {
            name: name.clone(),
            label: name.clone(),
            value: value.to_string(),
        });
    }

    ReadableInput { fields }
}
