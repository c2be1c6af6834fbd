pub mod readable;
pub mod result;
pub mod schema;
pub mod submission;

pub use readable::{ReadableField, ReadableInput, readable_input};
pub use result::{DisplayPayload, Narrative, PredictionResult, ResultError, format};
pub use schema::{
    FeatureGroup, FeatureKind, FeatureOption, FeatureSpec, Widget, feature_groups, features, find,
};
pub use submission::{RawValue, Submission, SubmissionError};
