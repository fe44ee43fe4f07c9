//! Data points: an embedding vector paired with scalar metadata.
//!
//! Metadata is an open, dynamically-keyed record whose values come from a
//! closed scalar variant. Keeping the value type closed (rather than an
//! arbitrary JSON value) keeps search and equality well-defined.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scalar metadata value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Free-form text
    Text(String),
    /// Boolean flag
    Flag(bool),
    /// Numeric value (integers included)
    Number(f64),
}

impl MetadataValue {
    /// Render the value as text for substring matching.
    pub fn to_text(&self) -> String {
        match self {
            MetadataValue::Text(s) => s.clone(),
            MetadataValue::Number(n) => n.to_string(),
            MetadataValue::Flag(b) => b.to_string(),
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Text(s) => write!(f, "{}", s),
            MetadataValue::Number(n) => write!(f, "{}", n),
            MetadataValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// An open, dynamically-keyed record of scalar metadata values.
pub type MetadataRecord = BTreeMap<String, MetadataValue>;

/// Parse a flat JSON object into a [`MetadataRecord`].
///
/// Only scalar values are accepted. Nested objects, arrays, and nulls are
/// rejected so the record stays within the closed scalar variant.
pub fn metadata_from_json(json: &str) -> Result<MetadataRecord> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let obj = match value {
        serde_json::Value::Object(obj) => obj,
        other => {
            return Err(Error::InvalidArgument(format!(
                "metadata must be a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut record = MetadataRecord::new();
    for (key, value) in obj {
        let scalar = match value {
            serde_json::Value::String(s) => MetadataValue::Text(s),
            serde_json::Value::Bool(b) => MetadataValue::Flag(b),
            serde_json::Value::Number(n) => {
                let n = n.as_f64().ok_or_else(|| {
                    Error::InvalidArgument(format!("metadata field '{}' is not a finite number", key))
                })?;
                MetadataValue::Number(n)
            }
            other => {
                return Err(Error::InvalidArgument(format!(
                    "metadata field '{}' must be a scalar, got {}",
                    key,
                    json_kind(&other)
                )))
            }
        };
        record.insert(key, scalar);
    }
    Ok(record)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// An embedding vector paired with its metadata record.
///
/// Immutable once ingested, except for in-place normalization of the
/// vector performed by the owning corpus.
#[derive(Clone, Debug, PartialEq)]
pub struct DataPoint {
    vector: Vec<f32>,
    metadata: MetadataRecord,
}

impl DataPoint {
    /// Create a new data point.
    pub fn new(vector: Vec<f32>, metadata: MetadataRecord) -> Self {
        Self { vector, metadata }
    }

    /// Create a data point with an empty metadata record.
    pub fn from_vector(vector: Vec<f32>) -> Self {
        Self {
            vector,
            metadata: MetadataRecord::new(),
        }
    }

    /// The embedding vector.
    pub fn vector(&self) -> &[f32] {
        &self.vector
    }

    /// The metadata record.
    pub fn metadata(&self) -> &MetadataRecord {
        &self.metadata
    }

    /// Vector dimensionality.
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }

    pub(crate) fn vector_mut(&mut self) -> &mut [f32] {
        &mut self.vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text() {
        assert_eq!(MetadataValue::Text("abc".into()).to_text(), "abc");
        assert_eq!(MetadataValue::Number(42.0).to_text(), "42");
        assert_eq!(MetadataValue::Number(1.5).to_text(), "1.5");
        assert_eq!(MetadataValue::Flag(true).to_text(), "true");
    }

    #[test]
    fn test_metadata_from_json_flat() {
        let record =
            metadata_from_json(r#"{"label": "cat", "score": 0.75, "held_out": false}"#).unwrap();
        assert_eq!(record["label"], MetadataValue::Text("cat".into()));
        assert_eq!(record["score"], MetadataValue::Number(0.75));
        assert_eq!(record["held_out"], MetadataValue::Flag(false));
    }

    #[test]
    fn test_metadata_from_json_rejects_nested() {
        let err = metadata_from_json(r#"{"inner": {"a": 1}}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = metadata_from_json(r#"{"tags": ["a", "b"]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));

        let err = metadata_from_json(r#"{"missing": null}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_metadata_from_json_rejects_non_object() {
        let err = metadata_from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_data_point_accessors() {
        let mut record = MetadataRecord::new();
        record.insert("index".into(), MetadataValue::Number(3.0));
        let point = DataPoint::new(vec![1.0, 2.0, 3.0], record);
        assert_eq!(point.dimension(), 3);
        assert_eq!(point.vector(), &[1.0, 2.0, 3.0]);
        assert_eq!(point.metadata().len(), 1);
    }
}
