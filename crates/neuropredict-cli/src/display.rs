//! Terminal cards for the `schema` and `predict` subcommands.
//!
//! Rendered into a `String` first, then printed, so the layout can be
//! checked without capturing stdout.

use std::fmt::Write;

use neuropredict_core::{DisplayPayload, FeatureKind, FeatureSpec, ReadableInput, feature_groups};

pub fn print_schema() {
    print!("{}", schema_card());
}

pub fn print_assessment(input: &ReadableInput, payload: &DisplayPayload, filled: &[String]) {
    print!("{}", assessment_card(input, payload, filled));
}

fn schema_card() -> String {
    let mut out = String::new();
    for group in feature_groups() {
        let _ = writeln!(out, "{}", group.title);
        for feature in group.features {
            let _ = writeln!(out, "  {:<26} {}", feature.name, describe(feature));
        }
        out.push('\n');
    }
    out
}

/// `"60 to 90 years (default 70)"` or `"Male=0, Female=1 (default 0)"`.
fn describe(feature: &FeatureSpec) -> String {
    match feature.kind {
        FeatureKind::Numeric { min, max, default } => {
            let unit = feature.unit.map(|u| format!(" {u}")).unwrap_or_default();
            format!("{min} to {max}{unit} (default {default})")
        }
        FeatureKind::Categorical {
            options, default, ..
        } => {
            let opts: Vec<String> = options
                .iter()
                .map(|o| format!("{}={}", o.label, o.value))
                .collect();
            format!("{} (default {default})", opts.join(", "))
        }
    }
}

fn assessment_card(input: &ReadableInput, payload: &DisplayPayload, filled: &[String]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ===", payload.title);
    let _ = writeln!(out, "Probability: {}", payload.probability_text);
    out.push('\n');

    let _ = writeln!(out, "{}", payload.description);
    let _ = writeln!(out, "{}", payload.recommendation);
    out.push('\n');

    out.push_str("Patient Data\n");
    for field in input.iter() {
        let _ = writeln!(out, "  {:<26} {}", field.label, field.value);
    }
    out.push('\n');

    if !filled.is_empty() {
        out.push_str("Missing (filled with 0)\n");
        let _ = writeln!(out, "  {}", filled.join(", "));
        out.push('\n');
    }
    out
}
