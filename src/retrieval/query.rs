//! Retrieval query synthesis from an edit record
//!
//! Terms are emitted in priority order: the part anchors retrieval to the
//! right object type, the parameter picks exemplars that touch the right
//! attribute, and feature terms come last so truncation drops them first.

use crate::edit::{EditRecord, FeatureKind};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Maximum number of terms in a query
pub const MAX_QUERY_TERMS: usize = 5;

/// Search terms associated with each feature kind.
pub fn feature_terms(feature: FeatureKind) -> &'static [&'static str] {
    match feature {
        FeatureKind::Extrusion => &["extrude"],
        FeatureKind::Revolve => &["revolve", "sphere"],
        FeatureKind::Cut => &["cut"],
        FeatureKind::Fillet => &["fillet"],
        FeatureKind::Chamfer => &["chamfer"],
        FeatureKind::Shell => &["shell", "hollow"],
        FeatureKind::Sweep => &["sweep"],
        FeatureKind::Loft => &["loft"],
        FeatureKind::Mirror => &["mirror"],
        FeatureKind::Pattern => &["pattern"],
        FeatureKind::Draft => &["draft"],
        FeatureKind::Hole => &["hole"],
        FeatureKind::Thicken => &["thicken"],
        FeatureKind::Wrap => &["wrap"],
    }
}

/// Search terms associated with a parameter label (case-insensitive).
pub fn parameter_terms(parameter: &str) -> &'static [&'static str] {
    match parameter.trim().to_lowercase().as_str() {
        "length" => &["length", "height"],
        "width" => &["width"],
        "height" => &["height", "length"],
        "diameter" => &["diameter", "circle"],
        "radius" => &["radius", "circle"],
        "thickness" => &["thickness"],
        "angle" => &["angle"],
        _ => &[],
    }
}

/// Ordered, deduplicated search terms derived from one edit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalQuery {
    terms: Vec<String>,
}

impl RetrievalQuery {
    pub fn from_record(record: &EditRecord) -> Self {
        let mut raw: Vec<String> = Vec::new();

        let part = record.part.trim();
        if !part.is_empty() {
            raw.push(part.to_string());
        }

        let parameter = record.parameter.trim();
        if !parameter.is_empty() {
            raw.push(parameter.to_lowercase());
            raw.extend(parameter_terms(parameter).iter().map(|t| t.to_string()));
        }

        raw.extend(feature_terms(record.feature).iter().map(|t| t.to_string()));

        let mut seen = HashSet::new();
        let terms = raw
            .into_iter()
            .filter(|term| seen.insert(term.clone()))
            .take(MAX_QUERY_TERMS)
            .collect();

        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn as_text(&self) -> String {
        self.terms.join(" ")
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }
}

impl fmt::Display for RetrievalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::EditValue;

    fn record(part: &str, parameter: &str, feature: FeatureKind) -> EditRecord {
        EditRecord {
            part: part.to_string(),
            feature,
            parameter: parameter.to_string(),
            value: EditValue::NewValue(10.0),
            unit: "mm".to_string(),
            confidence: 0.9,
        }
    }

    #[test]
    fn test_block_length_extrude() {
        let query = RetrievalQuery::from_record(&record("block", "Length", FeatureKind::Extrusion));
        assert_eq!(query.terms()[0], "block");
        assert_eq!(query.terms()[1], "length");
        assert_eq!(query.as_text(), "block length height extrude");
    }

    #[test]
    fn test_truncation_drops_feature_terms_first() {
        let query = RetrievalQuery::from_record(&record(
            "hollow cylinder",
            "Diameter",
            FeatureKind::Shell,
        ));
        assert_eq!(
            query.terms(),
            &["hollow cylinder", "diameter", "circle", "shell", "hollow"]
        );

        let query = RetrievalQuery::from_record(&record("ring", "Radius", FeatureKind::Revolve));
        assert_eq!(query.terms().len(), MAX_QUERY_TERMS);
        assert_eq!(query.as_text(), "ring radius circle revolve sphere");
    }

    #[test]
    fn test_unknown_parameter_has_no_synonyms() {
        let query = RetrievalQuery::from_record(&record("gear", "Teeth", FeatureKind::Pattern));
        assert_eq!(query.as_text(), "gear teeth pattern");
    }

    #[test]
    fn test_parameter_lookup_is_case_insensitive() {
        let query = RetrievalQuery::from_record(&record("tube", "DIAMETER", FeatureKind::Cut));
        assert!(query.contains("circle"));
    }

    #[test]
    fn test_empty_part_and_parameter_are_skipped() {
        let query = RetrievalQuery::from_record(&record("", " ", FeatureKind::Hole));
        assert_eq!(query.terms(), &["hole"]);
    }

    #[test]
    fn test_no_duplicates_ever() {
        for feature in FeatureKind::all_variants() {
            for parameter in ["Length", "Height", "Width", "Angle", "Thickness"] {
                let query = RetrievalQuery::from_record(&record("length", parameter, *feature));
                let unique: HashSet<&String> = query.terms().iter().collect();
                assert_eq!(unique.len(), query.terms().len());
                assert!(query.terms().len() <= MAX_QUERY_TERMS);
            }
        }
    }
}
