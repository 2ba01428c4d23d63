//! Fitted categorical label encoders
//!
//! A label encoder maps each label it saw during fitting to its index in the
//! ordered `classes` list. Labels outside that vocabulary cannot be encoded.

use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Serialized form: `{ "classes": ["Female", "Male"] }`
#[derive(Debug, Deserialize)]
struct LabelEncoderDoc {
    classes: Vec<String>,
}

/// A single fitted label encoder
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Build an encoder from its ordered vocabulary
    ///
    /// Fails on an empty or duplicated vocabulary.
    pub fn new(classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(Error::Artifact("label encoder has no classes".to_string()));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (index, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), index as i64).is_some() {
                return Err(Error::Artifact(format!(
                    "label encoder lists class '{}' more than once",
                    class
                )));
            }
        }

        Ok(Self { classes, codes })
    }

    /// Integer code for `label`, `None` if the label was never fitted
    pub fn transform(&self, label: &str) -> Option<i64> {
        self.codes.get(label).copied()
    }

    /// Label for `code`, `None` if out of range
    pub fn inverse_transform(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.classes.get(i))
            .map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

/// Column name to fitted encoder; immutable after load
#[derive(Debug, Clone, Default)]
pub struct EncoderMap {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderMap {
    /// Parse the encoder document: `{ column: { "classes": [...] }, ... }`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let docs: BTreeMap<String, LabelEncoderDoc> = serde_json::from_str(json)?;

        let mut encoders = BTreeMap::new();
        for (column, doc) in docs {
            let encoder = LabelEncoder::new(doc.classes)
                .map_err(|e| Error::Artifact(format!("encoder '{}': {}", column, e)))?;
            encoders.insert(column, encoder);
        }

        Ok(Self { encoders })
    }

    pub fn insert(&mut self, column: impl Into<String>, encoder: LabelEncoder) {
        self.encoders.insert(column.into(), encoder);
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder(classes: &[&str]) -> LabelEncoder {
        LabelEncoder::new(classes.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_transform_uses_class_index() {
        let enc = encoder(&["DSL", "Fiber optic", "No"]);
        assert_eq!(enc.transform("DSL"), Some(0));
        assert_eq!(enc.transform("No"), Some(2));
        assert_eq!(enc.inverse_transform(1), Some("Fiber optic"));
    }

    #[test]
    fn test_transform_unknown_label() {
        let enc = encoder(&["Female", "Male"]);
        assert_eq!(enc.transform("Other"), None);
        assert_eq!(enc.inverse_transform(-1), None);
        assert_eq!(enc.inverse_transform(2), None);
    }

    #[test]
    fn test_rejects_duplicate_classes() {
        let result = LabelEncoder::new(vec!["No".to_string(), "No".to_string()]);
        assert!(matches!(result, Err(Error::Artifact(_))));
    }

    #[test]
    fn test_rejects_empty_vocabulary() {
        assert!(LabelEncoder::new(Vec::new()).is_err());
    }

    #[test]
    fn test_encoder_map_from_json() {
        let json = r#"{
            "gender": {"classes": ["Female", "Male"]},
            "Contract": {"classes": ["Month-to-month", "One year", "Two year"]}
        }"#;
        let map = EncoderMap::from_json_str(json).unwrap();

        assert_eq!(map.len(), 2);
        assert!(map.contains("gender"));
        assert!(!map.contains("tenure"));
        assert_eq!(map.get("Contract").unwrap().transform("Two year"), Some(2));
    }

    #[test]
    fn test_encoder_map_reports_bad_column() {
        let json = r#"{"Partner": {"classes": []}}"#;
        let err = EncoderMap::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("Partner"));
    }
}
