use crate::edit::FeatureKind;
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys accepted for the absolute-value field, in lookup order.
pub const NEW_VALUE_KEYS: [&str; 2] = ["new_value", "newValue"];
pub const DELTA_KEY: &str = "delta";
pub const REQUIRED_FIELDS: [&str; 5] = ["part", "feature", "parameter", "unit", "confidence"];
const TEXT_FIELDS: [&str; 3] = ["part", "feature", "parameter"];

/// One failed field contract on a candidate edit object
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("candidate is not a JSON object (got {0})")]
    NotAnObject(&'static str),

    #[error("model reported an error: {0}")]
    SelfReported(String),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("field '{0}' must be a string")]
    NotAString(&'static str),

    #[error("unit must be a string, got {0}")]
    UnitNotString(&'static str),

    #[error("invalid unit '{0}' - must be 'mm'")]
    InvalidUnit(String),

    #[error("confidence must be a number, got {0}")]
    ConfidenceNotNumeric(&'static str),

    #[error("invalid confidence {0} - must be between 0 and 1")]
    ConfidenceOutOfRange(f64),

    #[error("more than one of 'new_value', 'newValue' and 'delta' present - only one allowed")]
    BothValues,

    #[error("either 'new_value' or 'delta' must be present")]
    NoValue,

    #[error("'{field}' must be numeric, got {found}")]
    ValueNotNumeric {
        field: &'static str,
        found: &'static str,
    },

    #[error(
        "invalid feature '{}' - must be one of {}",
        .0,
        FeatureKind::all_ids().join(", ")
    )]
    UnknownFeature(String),
}

impl Violation {
    pub fn is_self_reported(&self) -> bool {
        matches!(self, Violation::SelfReported(_))
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Returns the key and value of the absolute-value field, if present.
pub(crate) fn new_value_entry(candidate: &Map<String, Value>) -> Option<(&'static str, &Value)> {
    NEW_VALUE_KEYS
        .iter()
        .find_map(|key| candidate.get(*key).map(|v| (*key, v)))
}

/// Every value field present on the candidate, in key order.
fn value_entries(candidate: &Map<String, Value>) -> impl Iterator<Item = (&'static str, &Value)> {
    NEW_VALUE_KEYS
        .iter()
        .chain(std::iter::once(&DELTA_KEY))
        .filter_map(|key| candidate.get(*key).map(|v| (*key, v)))
}

/// A single field contract checked against a candidate object.
///
/// Rules only inspect fields that are present; absence is the business of
/// [`RequiredFieldsRule`].
pub trait ValidationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation>;

    /// When true, a failure of this rule ends validation immediately.
    fn halts_on_failure(&self) -> bool {
        false
    }
}

pub struct SelfReportedErrorRule;

impl ValidationRule for SelfReportedErrorRule {
    fn name(&self) -> &'static str {
        "SelfReportedError"
    }

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation> {
        match candidate.get("error") {
            Some(Value::String(message)) => vec![Violation::SelfReported(message.clone())],
            Some(other) => vec![Violation::SelfReported(other.to_string())],
            None => Vec::new(),
        }
    }

    fn halts_on_failure(&self) -> bool {
        true
    }
}

pub struct RequiredFieldsRule;

impl ValidationRule for RequiredFieldsRule {
    fn name(&self) -> &'static str {
        "RequiredFields"
    }

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation> {
        let mut violations = Vec::new();

        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !candidate.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            violations.push(Violation::MissingFields(missing));
        }

        for field in TEXT_FIELDS {
            if let Some(value) = candidate.get(field) {
                if !value.is_string() {
                    violations.push(Violation::NotAString(field));
                }
            }
        }

        violations
    }
}

pub struct UnitRule;

impl ValidationRule for UnitRule {
    fn name(&self) -> &'static str {
        "Unit"
    }

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation> {
        match candidate.get("unit") {
            None => Vec::new(),
            Some(Value::String(unit)) if unit.eq_ignore_ascii_case("mm") => Vec::new(),
            Some(Value::String(unit)) => vec![Violation::InvalidUnit(unit.clone())],
            Some(other) => vec![Violation::UnitNotString(json_type_name(other))],
        }
    }
}

pub struct ConfidenceRangeRule;

impl ValidationRule for ConfidenceRangeRule {
    fn name(&self) -> &'static str {
        "ConfidenceRange"
    }

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation> {
        match candidate.get("confidence") {
            None => Vec::new(),
            Some(value) => match value.as_f64() {
                Some(c) if (0.0..=1.0).contains(&c) => Vec::new(),
                Some(c) => vec![Violation::ConfidenceOutOfRange(c)],
                None => vec![Violation::ConfidenceNotNumeric(json_type_name(value))],
            },
        }
    }
}

pub struct ExclusiveValueRule;

impl ValidationRule for ExclusiveValueRule {
    fn name(&self) -> &'static str {
        "ExclusiveValue"
    }

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation> {
        match value_entries(candidate).count() {
            0 => vec![Violation::NoValue],
            1 => Vec::new(),
            _ => vec![Violation::BothValues],
        }
    }
}

pub struct NumericValueRule;

impl ValidationRule for NumericValueRule {
    fn name(&self) -> &'static str {
        "NumericValue"
    }

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation> {
        let mut violations = Vec::new();

        for (field, value) in value_entries(candidate) {
            if value.as_f64().is_none() {
                violations.push(Violation::ValueNotNumeric {
                    field,
                    found: json_type_name(value),
                });
            }
        }

        violations
    }
}

pub struct KnownFeatureRule;

impl ValidationRule for KnownFeatureRule {
    fn name(&self) -> &'static str {
        "KnownFeature"
    }

    fn check(&self, candidate: &Map<String, Value>) -> Vec<Violation> {
        match candidate.get("feature") {
            Some(Value::String(id)) if FeatureKind::from_id(id).is_none() => {
                vec![Violation::UnknownFeature(id.clone())]
            }
            _ => Vec::new(),
        }
    }
}
