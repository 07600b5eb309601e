//! Rule-based field extraction over OCR text.

pub mod engine;
pub mod patterns;
pub mod registry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use engine::{extract_generic, normalize_whitespace, FieldEngine};
pub use registry::{PatternRegistry, PatternRule, STANDARD_REGISTRY};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// Value of an extracted field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// First match of a labelled field.
    Single(String),
    /// Every match of a generic pattern, in text order.
    Multiple(Vec<String>),
}

impl FieldValue {
    /// All values, one for `Single`.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(value) => vec![value.as_str()],
            FieldValue::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Fields extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Field name to value. Absent keys mean no match.
    pub fields: BTreeMap<String, FieldValue>,

    /// Checksum verdict per identity number, parallel to the `NIF`/`NIE` lists.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub identity_checks: BTreeMap<String, Vec<bool>>,

    /// Non-fatal observations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a single-valued field.
    pub fn single(&self, name: &str) -> Option<&str> {
        match self.fields.get(name)? {
            FieldValue::Single(value) => Some(value),
            FieldValue::Multiple(_) => None,
        }
    }

    /// Get a multi-valued field.
    pub fn multiple(&self, name: &str) -> Option<&[String]> {
        match self.fields.get(name)? {
            FieldValue::Multiple(values) => Some(values),
            FieldValue::Single(_) => None,
        }
    }

    /// Whether no field matched.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Every identity number with its checksum verdict.
    pub fn identity_numbers(&self) -> Vec<(&str, &str, bool)> {
        let mut numbers = Vec::new();
        for (field, checks) in &self.identity_checks {
            if let Some(values) = self.multiple(field) {
                for (value, valid) in values.iter().zip(checks) {
                    numbers.push((field.as_str(), value.as_str(), *valid));
                }
            }
        }
        numbers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_serializes_untagged() {
        let single = serde_json::to_string(&FieldValue::Single("JUAN".into())).unwrap();
        assert_eq!(single, "\"JUAN\"");

        let multiple = serde_json::to_string(&FieldValue::Multiple(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(multiple, "[\"a\",\"b\"]");

        let back: FieldValue = serde_json::from_str("[\"x\"]").unwrap();
        assert_eq!(back, FieldValue::Multiple(vec!["x".into()]));
    }

    #[test]
    fn test_result_accessors() {
        let mut result = ExtractionResult::default();
        assert!(result.is_empty());

        result.fields.insert("NAME".into(), FieldValue::Single("ANA".into()));
        result
            .fields
            .insert("NIF".into(), FieldValue::Multiple(vec!["12345678Z".into(), "12345678A".into()]));
        result.identity_checks.insert("NIF".into(), vec![true, false]);

        assert_eq!(result.single("NAME"), Some("ANA"));
        assert_eq!(result.single("NIF"), None);
        assert_eq!(result.multiple("NIF").map(|v| v.len()), Some(2));
        assert_eq!(
            result.identity_numbers(),
            vec![("NIF", "12345678Z", true), ("NIF", "12345678A", false)]
        );
    }

    #[test]
    fn test_empty_result_omits_annotations() {
        let json = serde_json::to_string(&ExtractionResult::default()).unwrap();
        assert_eq!(json, "{\"fields\":{}}");
    }
}
