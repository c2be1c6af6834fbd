//! Report layer: renders a prediction and its inputs as a PDF document.

mod pdf;

pub use pdf::{REPORT_FILENAME, ReportError, render_report, render_report_at};
