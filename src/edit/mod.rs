//! Edit record data model
//!
//! An [`EditRecord`] is one validated parametric change to a modeled object.
//! Records are only produced by the validator, and an [`EditBatch`] is only
//! produced by the batch guard, so holding either type means every field
//! contract already passed.

mod id_enum_macro;

use serde::{Deserialize, Serialize};
use std::fmt;

crate::define_id_enum! {
    /// Modeling feature touched by an edit
    FeatureKind {
        Extrusion => "Extrude1": "extrusion",
        Revolve => "Revolve1": "revolve",
        Cut => "Cut1": "cut",
        Fillet => "Fillet1": "fillet",
        Chamfer => "Chamfer1": "chamfer",
        Shell => "Shell1": "shell",
        Sweep => "Sweep1": "sweep",
        Loft => "Loft1": "loft",
        Mirror => "Mirror1": "mirror",
        Pattern => "Pattern1": "pattern",
        Draft => "Draft1": "draft",
        Hole => "Hole1": "hole",
        Thicken => "Thicken1": "thicken",
        Wrap => "Wrap1": "wrap",
    }
}

/// Target of an edit: either an absolute value or a signed change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EditValue {
    /// Absolute target value
    #[serde(rename = "new_value", alias = "newValue")]
    NewValue(f64),
    /// Signed change relative to the current value
    #[serde(rename = "delta")]
    Delta(f64),
}

impl EditValue {
    pub fn amount(&self) -> f64 {
        match self {
            EditValue::NewValue(v) | EditValue::Delta(v) => *v,
        }
    }

    pub fn is_delta(&self) -> bool {
        matches!(self, EditValue::Delta(_))
    }
}

/// One validated parametric change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRecord {
    /// Object or feature being changed (e.g. "block", "cylinder")
    pub part: String,
    pub feature: FeatureKind,
    /// Dimension or attribute being changed (e.g. "Length")
    pub parameter: String,
    #[serde(flatten)]
    pub value: EditValue,
    /// Always "mm" after validation, lowercased
    pub unit: String,
    /// Model confidence in [0, 1]
    pub confidence: f64,
}

impl fmt::Display for EditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            EditValue::NewValue(v) => write!(
                f,
                "{} {} ({}) = {}{}",
                self.part, self.parameter, self.feature, v, self.unit
            ),
            EditValue::Delta(v) => write!(
                f,
                "{} {} ({}) {:+}{}",
                self.part, self.parameter, self.feature, v, self.unit
            ),
        }
    }
}

/// Ordered, non-empty, bounded sequence of edit records from one instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EditBatch {
    records: Vec<EditRecord>,
}

impl EditBatch {
    /// Only the batch guard builds batches; it checks the size bounds.
    pub(crate) fn from_guarded(records: Vec<EditRecord>) -> Self {
        debug_assert!(!records.is_empty());
        Self { records }
    }

    /// The record used for retrieval query synthesis.
    pub fn first(&self) -> &EditRecord {
        &self.records[0]
    }

    pub fn records(&self) -> &[EditRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EditRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<EditRecord> {
        self.records
    }
}

impl<'a> IntoIterator for &'a EditBatch {
    type Item = &'a EditRecord;
    type IntoIter = std::slice::Iter<'a, EditRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_length() -> EditRecord {
        EditRecord {
            part: "block".to_string(),
            feature: FeatureKind::Extrusion,
            parameter: "Length".to_string(),
            value: EditValue::NewValue(50.0),
            unit: "mm".to_string(),
            confidence: 0.95,
        }
    }

    #[test]
    fn test_feature_ids_round_trip_through_from_id() {
        assert_eq!(FeatureKind::all_variants().len(), 14);
        for kind in FeatureKind::all_variants() {
            assert_eq!(FeatureKind::from_id(kind.id()), Some(*kind));
        }
    }

    #[test]
    fn test_feature_from_id_is_exact() {
        assert_eq!(FeatureKind::from_id("Hole1"), Some(FeatureKind::Hole));
        assert_eq!(FeatureKind::from_id("hole1"), None);
        assert_eq!(FeatureKind::from_id("Extrude2"), None);
    }

    #[test]
    fn test_feature_deserialize_rejects_unknown() {
        let err = serde_json::from_str::<FeatureKind>("\"Bend1\"").unwrap_err();
        assert!(err.to_string().contains("Bend1"));
        let ok: FeatureKind = serde_json::from_str("\"Shell1\"").unwrap();
        assert_eq!(ok, FeatureKind::Shell);
        assert_eq!(ok.name(), "shell");
    }

    #[test]
    fn test_record_serializes_to_wire_form() {
        let json = serde_json::to_value(block_length()).unwrap();
        assert_eq!(json["feature"], "Extrude1");
        assert_eq!(json["new_value"], 50.0);
        assert!(json.get("delta").is_none());
    }

    #[test]
    fn test_delta_record_serializes_delta_key() {
        let mut record = block_length();
        record.value = EditValue::Delta(-5.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["delta"], -5.0);
        assert!(json.get("new_value").is_none());
        assert!(record.value.is_delta());
        assert_eq!(record.to_string(), "block Length (Extrude1) -5mm");
    }

    #[test]
    fn test_batch_first_and_len() {
        let mut second = block_length();
        second.parameter = "Width".to_string();
        let batch = EditBatch::from_guarded(vec![block_length(), second]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.first().parameter, "Length");
        assert_eq!(batch.iter().nth(1).unwrap().parameter, "Width");
    }
}
