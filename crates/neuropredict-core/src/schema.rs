//! Declarative feature schema for the clinical intake form.
//!
//! Every input the classifier consumes is described here once: its key, display
//! label, unit, and whether it is a bounded number or a choice between coded
//! options. The same data drives widget rendering and turns submitted codes
//! back into human-readable labels for reports.

use serde::Serialize;

/// A named card of related features. Grouping is for display only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureGroup {
    pub title: &'static str,
    /// Font Awesome icon class shown in the card header.
    pub icon: &'static str,
    /// Accent colour for the card header.
    pub color: &'static str,
    pub features: &'static [FeatureSpec],
}

/// One input variable of the model.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FeatureSpec {
    /// Unique key, identical to the model's column name.
    pub name: &'static str,
    pub label: &'static str,
    pub unit: Option<&'static str>,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric {
        min: f64,
        max: f64,
        default: f64,
    },
    Categorical {
        options: &'static [FeatureOption],
        widget: Widget,
        /// Code of the option selected when the form first renders.
        default: i64,
    },
}

/// How a categorical feature is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Dropdown,
    Radio,
}

/// A human label and the code the model was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureOption {
    pub label: &'static str,
    pub value: i64,
}

impl FeatureSpec {
    /// Value used when the form is first rendered.
    pub fn default_value(&self) -> f64 {
        match self.kind {
            FeatureKind::Numeric { default, .. } => default,
            FeatureKind::Categorical { default, .. } => default as f64,
        }
    }

    /// Option list for categorical features, empty for numeric ones.
    pub fn options(&self) -> &'static [FeatureOption] {
        match self.kind {
            FeatureKind::Numeric { .. } => &[],
            FeatureKind::Categorical { options, .. } => options,
        }
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self.kind, FeatureKind::Categorical { .. })
    }

    /// Code for a human label, e.g. `"Female"` → `1`.
    pub fn encode_label(&self, label: &str) -> Option<i64> {
        self.options()
            .iter()
            .find(|opt| opt.label == label)
            .map(|opt| opt.value)
    }

    /// Human label for a submitted code, e.g. `1.0` → `"Female"`.
    ///
    /// Only integral values can match; `0.5` decodes to nothing.
    pub fn decode_value(&self, value: f64) -> Option<&'static str> {
        if !value.is_finite() || value.fract() != 0.0 {
            return None;
        }
        let code = value as i64;
        self.options()
            .iter()
            .find(|opt| opt.value == code)
            .map(|opt| opt.label)
    }
}

/// The clinical schema, in display order.
pub fn feature_groups() -> &'static [FeatureGroup] {
    FEATURE_GROUPS
}

/// Iterate over every feature across all groups, in display order.
pub fn features() -> impl Iterator<Item = &'static FeatureSpec> {
    FEATURE_GROUPS.iter().flat_map(|g| g.features.iter())
}

/// Look up a feature by its key.
pub fn find(name: &str) -> Option<&'static FeatureSpec> {
    features().find(|f| f.name == name)
}

// ── Schema data ──

const YES_NO: &[FeatureOption] = &[
    FeatureOption { label: "No", value: 0 },
    FeatureOption { label: "Yes", value: 1 },
];

const GENDER: &[FeatureOption] = &[
    FeatureOption { label: "Male", value: 0 },
    FeatureOption { label: "Female", value: 1 },
];

const ETHNICITY: &[FeatureOption] = &[
    FeatureOption { label: "Caucasian", value: 0 },
    FeatureOption { label: "African American", value: 1 },
    FeatureOption { label: "Asian", value: 2 },
    FeatureOption { label: "Other", value: 3 },
];

const EDUCATION: &[FeatureOption] = &[
    FeatureOption { label: "None", value: 0 },
    FeatureOption { label: "High School", value: 1 },
    FeatureOption { label: "Bachelor's", value: 2 },
    FeatureOption { label: "Higher", value: 3 },
];

const fn numeric(
    name: &'static str,
    label: &'static str,
    unit: &'static str,
    min: f64,
    max: f64,
    default: f64,
) -> FeatureSpec {
    FeatureSpec {
        name,
        label,
        unit: Some(unit),
        kind: FeatureKind::Numeric { min, max, default },
    }
}

const fn dropdown(
    name: &'static str,
    label: &'static str,
    options: &'static [FeatureOption],
) -> FeatureSpec {
    FeatureSpec {
        name,
        label,
        unit: None,
        kind: FeatureKind::Categorical {
            options,
            widget: Widget::Dropdown,
            default: 0,
        },
    }
}

const fn yes_no(name: &'static str, label: &'static str) -> FeatureSpec {
    FeatureSpec {
        name,
        label,
        unit: None,
        kind: FeatureKind::Categorical {
            options: YES_NO,
            widget: Widget::Radio,
            default: 0,
        },
    }
}

static FEATURE_GROUPS: &[FeatureGroup] = &[
    FeatureGroup {
        title: "Patient Demographics",
        icon: "fa-user",
        color: "#6366f1",
        features: &[
            numeric("Age", "Age", "years", 60.0, 90.0, 70.0),
            dropdown("Gender", "Gender", GENDER),
            dropdown("Ethnicity", "Ethnicity", ETHNICITY),
            dropdown("EducationLevel", "Education Level", EDUCATION),
            numeric("BMI", "BMI", "kg/m²", 15.0, 40.0, 25.0),
        ],
    },
    FeatureGroup {
        title: "Lifestyle Factors",
        icon: "fa-heart-pulse",
        color: "#ec4899",
        features: &[
            yes_no("Smoking", "Smoker?"),
            numeric("AlcoholConsumption", "Alcohol Consumption", "units/week", 0.0, 20.0, 5.0),
            numeric("PhysicalActivity", "Physical Activity", "hrs/week", 0.0, 10.0, 5.0),
            numeric("DietQuality", "Diet Quality", "0-10", 0.0, 10.0, 5.0),
            numeric("SleepQuality", "Sleep Quality", "4-10", 4.0, 10.0, 7.0),
        ],
    },
    FeatureGroup {
        title: "Medical History",
        icon: "fa-notes-medical",
        color: "#f59e0b",
        features: &[
            yes_no("FamilyHistoryAlzheimers", "Family History of Alzheimer's"),
            yes_no("CardiovascularDisease", "Cardiovascular Disease"),
            yes_no("Diabetes", "Diabetes"),
            yes_no("Depression", "Depression"),
            yes_no("HeadInjury", "History of Head Injury"),
            yes_no("Hypertension", "Hypertension"),
        ],
    },
    FeatureGroup {
        title: "Clinical Measurements",
        icon: "fa-stethoscope",
        color: "#10b981",
        features: &[
            numeric("SystolicBP", "Systolic BP", "mmHg", 90.0, 180.0, 120.0),
            numeric("DiastolicBP", "Diastolic BP", "mmHg", 60.0, 120.0, 80.0),
            numeric("CholesterolTotal", "Total Cholesterol", "mg/dL", 150.0, 300.0, 200.0),
            numeric("CholesterolLDL", "LDL Cholesterol", "mg/dL", 50.0, 200.0, 100.0),
            numeric("CholesterolHDL", "HDL Cholesterol", "mg/dL", 20.0, 100.0, 50.0),
            numeric("CholesterolTriglycerides", "Triglycerides", "mg/dL", 50.0, 400.0, 150.0),
        ],
    },
    FeatureGroup {
        title: "Cognitive & Symptoms",
        icon: "fa-brain",
        color: "#8b5cf6",
        features: &[
            numeric("MMSE", "MMSE Score", "0-30", 0.0, 30.0, 25.0),
            numeric("FunctionalAssessment", "Functional Assessment", "0-10", 0.0, 10.0, 5.0),
            numeric("ADL", "ADL Score", "0-10", 0.0, 10.0, 8.0),
            yes_no("MemoryComplaints", "Memory Complaints"),
            yes_no("BehavioralProblems", "Behavioral Problems"),
            yes_no("Confusion", "Confusion"),
            yes_no("Disorientation", "Disorientation"),
            yes_no("PersonalityChanges", "Personality Changes"),
            yes_no("DifficultyCompletingTasks", "Difficulty Completing Tasks"),
            yes_no("Forgetfulness", "Forgetfulness"),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn feature_names_are_unique() {
        let names: Vec<&str> = features().map(|f| f.name).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert_eq!(names.len(), 32);
    }

    #[test]
    fn categorical_defaults_are_declared_options() {
        for f in features() {
            if let FeatureKind::Categorical { options, default, .. } = f.kind {
                assert!(
                    options.iter().any(|o| o.value == default),
                    "{} default {default} is not an option",
                    f.name
                );
            }
        }
    }

    #[test]
    fn numeric_defaults_within_bounds() {
        for f in features() {
            if let FeatureKind::Numeric { min, max, default } = f.kind {
                assert!(min <= default && default <= max, "{} default out of bounds", f.name);
            }
        }
    }

    #[test]
    fn encode_then_decode_returns_label() {
        for f in features().filter(|f| f.is_categorical()) {
            for opt in f.options() {
                let code = f.encode_label(opt.label).unwrap();
                assert_eq!(f.decode_value(code as f64), Some(opt.label));
            }
        }
    }

    #[test]
    fn decode_rejects_fractional_and_unknown_codes() {
        let gender = find("Gender").unwrap();
        assert_eq!(gender.decode_value(0.5), None);
        assert_eq!(gender.decode_value(7.0), None);
        assert_eq!(gender.decode_value(f64::NAN), None);
    }

    #[test]
    fn numeric_features_have_no_options() {
        let age = find("Age").unwrap();
        assert!(age.options().is_empty());
        assert_eq!(age.encode_label("70"), None);
        assert_eq!(age.default_value(), 70.0);
    }

    #[test]
    fn find_unknown_feature() {
        assert!(find("Nonexistent").is_none());
    }

    #[test]
    fn schema_serializes_with_kind_tag() {
        let json = serde_json::to_value(find("Smoking").unwrap()).unwrap();
        assert_eq!(json["kind"], "categorical");
        assert_eq!(json["widget"], "radio");
        assert_eq!(json["options"][1]["label"], "Yes");

        let json = serde_json::to_value(find("BMI").unwrap()).unwrap();
        assert_eq!(json["kind"], "numeric");
        assert_eq!(json["max"], 40.0);
    }
}
