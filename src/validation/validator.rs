use crate::edit::{EditRecord, EditValue, FeatureKind};
use crate::validation::rules::{
    json_type_name, new_value_entry, ConfidenceRangeRule, ExclusiveValueRule, KnownFeatureRule,
    NumericValueRule, RequiredFieldsRule, SelfReportedErrorRule, UnitRule, ValidationRule,
    Violation, DELTA_KEY,
};
use serde_json::{Map, Value};
use tracing::debug;

/// Result of validating one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    /// Present only when every rule passed
    pub record: Option<EditRecord>,
    /// Every failed check, in rule order
    pub violations: Vec<Violation>,
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        self.record.is_some()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }
}

/// A candidate that failed validation, with its position in the response
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCandidate {
    pub index: usize,
    pub violations: Vec<Violation>,
}

impl RejectedCandidate {
    pub fn summary(&self) -> String {
        let reasons: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        format!("candidate #{}: {}", self.index + 1, reasons.join("; "))
    }

    /// True when `rejected` is non-empty and every rejection was the model
    /// flagging its own output.
    pub fn all_self_reported(rejected: &[RejectedCandidate]) -> bool {
        !rejected.is_empty()
            && rejected
                .iter()
                .all(|r| r.violations.iter().any(Violation::is_self_reported))
    }
}

/// Validation results for every candidate extracted from one response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    /// Raw candidate count before validation
    pub candidate_count: usize,
    pub accepted: Vec<EditRecord>,
    pub rejected: Vec<RejectedCandidate>,
}

impl ValidationReport {
    /// True when every rejection was the model flagging its own output.
    pub fn all_self_reported(&self) -> bool {
        RejectedCandidate::all_self_reported(&self.rejected)
    }
}

/// Enforces the edit-record contract on candidate JSON values
pub struct EditRecordValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl EditRecordValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    pub fn validate(&self, candidate: &Value) -> ValidationOutcome {
        let Some(object) = candidate.as_object() else {
            return ValidationOutcome {
                record: None,
                violations: vec![Violation::NotAnObject(json_type_name(candidate))],
            };
        };

        let mut violations = Vec::new();
        for rule in &self.rules {
            let found = rule.check(object);
            if found.is_empty() {
                continue;
            }
            debug!("[{}] {} violation(s)", rule.name(), found.len());
            let halt = rule.halts_on_failure();
            violations.extend(found);
            if halt {
                break;
            }
        }

        if !violations.is_empty() {
            return ValidationOutcome {
                record: None,
                violations,
            };
        }

        match build_record(object) {
            Ok(record) => ValidationOutcome {
                record: Some(record),
                violations,
            },
            Err(violation) => ValidationOutcome {
                record: None,
                violations: vec![violation],
            },
        }
    }

    pub fn validate_all(&self, candidates: &[Value]) -> ValidationReport {
        let mut report = ValidationReport {
            candidate_count: candidates.len(),
            ..Default::default()
        };

        for (index, candidate) in candidates.iter().enumerate() {
            let outcome = self.validate(candidate);
            match outcome.record {
                Some(record) => report.accepted.push(record),
                None => report.rejected.push(RejectedCandidate {
                    index,
                    violations: outcome.violations,
                }),
            }
        }

        report
    }
}

impl Default for EditRecordValidator {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(SelfReportedErrorRule),
                Box::new(RequiredFieldsRule),
                Box::new(UnitRule),
                Box::new(ConfidenceRangeRule),
                Box::new(ExclusiveValueRule),
                Box::new(NumericValueRule),
                Box::new(KnownFeatureRule),
            ],
        }
    }
}

fn text_field(object: &Map<String, Value>, field: &'static str) -> Result<String, Violation> {
    match object.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(Violation::NotAString(field)),
        None => Err(Violation::MissingFields(vec![field])),
    }
}

fn number_field(object: &Map<String, Value>, field: &'static str) -> Result<f64, Violation> {
    match object.get(field) {
        Some(value) => value.as_f64().ok_or(Violation::ValueNotNumeric {
            field,
            found: json_type_name(value),
        }),
        None => Err(Violation::MissingFields(vec![field])),
    }
}

/// Builds the typed record from an object that already passed every rule.
fn build_record(object: &Map<String, Value>) -> Result<EditRecord, Violation> {
    let feature_id = text_field(object, "feature")?;
    let feature =
        FeatureKind::from_id(&feature_id).ok_or(Violation::UnknownFeature(feature_id))?;

    let value = match new_value_entry(object) {
        Some((field, v)) => EditValue::NewValue(v.as_f64().ok_or(Violation::ValueNotNumeric {
            field,
            found: json_type_name(v),
        })?),
        None => EditValue::Delta(number_field(object, DELTA_KEY)?),
    };

    Ok(EditRecord {
        part: text_field(object, "part")?,
        feature,
        parameter: text_field(object, "parameter")?,
        value,
        unit: text_field(object, "unit")?.to_lowercase(),
        confidence: number_field(object, "confidence")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid() -> Value {
        json!({
            "part": "block",
            "feature": "Extrude1",
            "parameter": "Length",
            "new_value": 50,
            "unit": "mm",
            "confidence": 0.95
        })
    }

    #[test]
    fn test_valid_candidate_builds_record() {
        let outcome = EditRecordValidator::new().validate(&valid());
        assert!(outcome.is_accepted());
        let record = outcome.record.unwrap();
        assert_eq!(record.part, "block");
        assert_eq!(record.feature, FeatureKind::Extrusion);
        assert_eq!(record.value, EditValue::NewValue(50.0));
        assert_eq!(record.confidence, 0.95);
    }

    #[test]
    fn test_camel_case_new_value_accepted() {
        let mut candidate = valid();
        let obj = candidate.as_object_mut().unwrap();
        obj.remove("new_value");
        obj.insert("newValue".to_string(), json!(12.5));
        let outcome = EditRecordValidator::new().validate(&candidate);
        assert_eq!(outcome.record.unwrap().value, EditValue::NewValue(12.5));
    }

    #[test]
    fn test_uppercase_unit_is_stored_lowercase() {
        let mut candidate = valid();
        candidate["unit"] = json!("MM");
        let record = EditRecordValidator::new().validate(&candidate).record.unwrap();
        assert_eq!(record.unit, "mm");
    }

    #[test]
    fn test_error_key_stops_further_checks() {
        let outcome = EditRecordValidator::new().validate(&json!({"error": "ambiguous instruction"}));
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.violations.len(), 1);
        assert!(outcome.violations[0].is_self_reported());
    }

    #[test]
    fn test_every_failed_check_is_reported() {
        let candidate = json!({
            "part": "block",
            "feature": "Bend1",
            "parameter": "Length",
            "unit": "inch",
            "confidence": 3
        });
        let outcome = EditRecordValidator::new().validate(&candidate);
        let reasons = outcome.reasons();
        assert_eq!(reasons.len(), 4, "{:?}", reasons);
        assert!(reasons[0].contains("inch"));
        assert!(reasons[1].contains("confidence"));
        assert!(reasons[2].contains("either"));
        assert!(reasons[3].contains("Bend1"));
    }

    #[test]
    fn test_non_object_candidate() {
        let outcome = EditRecordValidator::new().validate(&json!(42));
        assert_eq!(outcome.violations, vec![Violation::NotAnObject("number")]);
    }

    #[test]
    fn test_validate_all_keeps_indices() {
        let mut bad = valid();
        bad["unit"] = json!("cm");
        let report = EditRecordValidator::new().validate_all(&[valid(), bad, valid()]);
        assert_eq!(report.candidate_count, 3);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].index, 1);
        assert!(report.rejected[0].summary().starts_with("candidate #2:"));
        assert!(!report.all_self_reported());
    }

    #[test]
    fn test_custom_rule_set() {
        let validator = EditRecordValidator::with_rules(vec![Box::new(UnitRule)]);
        let outcome = validator.validate(&json!({"unit": "cm"}));
        assert_eq!(outcome.violations.len(), 1);
    }
}
