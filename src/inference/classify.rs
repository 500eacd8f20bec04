//! Type classification for store-native values

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::config::AnalyzerConfig;
use super::error::InferenceError;
use super::semantic::{SemanticDetector, detector_chain};
use crate::value::Value;

/// Base classification of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BsonType {
    Null,
    /// Synthesized for documents in which a field is absent
    Undefined,
    Boolean,
    /// Untyped JSON number
    Number,
    Int32,
    Long,
    Double,
    Decimal128,
    String,
    ObjectId,
    Date,
    Timestamp,
    Binary,
    RegExp,
    Code,
    Symbol,
    MinKey,
    MaxKey,
    DBRef,
    Document,
    Array,
}

impl BsonType {
    /// Every type in the taxonomy
    pub const ALL: [BsonType; 21] = [
        BsonType::Null,
        BsonType::Undefined,
        BsonType::Boolean,
        BsonType::Number,
        BsonType::Int32,
        BsonType::Long,
        BsonType::Double,
        BsonType::Decimal128,
        BsonType::String,
        BsonType::ObjectId,
        BsonType::Date,
        BsonType::Timestamp,
        BsonType::Binary,
        BsonType::RegExp,
        BsonType::Code,
        BsonType::Symbol,
        BsonType::MinKey,
        BsonType::MaxKey,
        BsonType::DBRef,
        BsonType::Document,
        BsonType::Array,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BsonType::Null => "Null",
            BsonType::Undefined => "Undefined",
            BsonType::Boolean => "Boolean",
            BsonType::Number => "Number",
            BsonType::Int32 => "Int32",
            BsonType::Long => "Long",
            BsonType::Double => "Double",
            BsonType::Decimal128 => "Decimal128",
            BsonType::String => "String",
            BsonType::ObjectId => "ObjectId",
            BsonType::Date => "Date",
            BsonType::Timestamp => "Timestamp",
            BsonType::Binary => "Binary",
            BsonType::RegExp => "RegExp",
            BsonType::Code => "Code",
            BsonType::Symbol => "Symbol",
            BsonType::MinKey => "MinKey",
            BsonType::MaxKey => "MaxKey",
            BsonType::DBRef => "DBRef",
            BsonType::Document => "Document",
            BsonType::Array => "Array",
        }
    }

    /// Types whose every value is identical
    pub fn is_constant(&self) -> bool {
        matches!(self, BsonType::Null | BsonType::Undefined)
    }

    /// Text values are sampled with a smaller reservoir
    pub fn is_text(&self) -> bool {
        matches!(self, BsonType::String)
    }
}

impl fmt::Display for BsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BsonType {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BsonType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| InferenceError::UnknownType(s.to_string()))
    }
}

/// Base classification of a single value
pub fn classify(value: &Value) -> BsonType {
    match value {
        Value::Null => BsonType::Null,
        Value::Undefined => BsonType::Undefined,
        Value::Boolean(_) => BsonType::Boolean,
        Value::Number(_) => BsonType::Number,
        Value::Int32(_) => BsonType::Int32,
        Value::Long(_) => BsonType::Long,
        Value::Double(_) => BsonType::Double,
        Value::Decimal128(_) => BsonType::Decimal128,
        Value::String(_) => BsonType::String,
        Value::ObjectId(_) => BsonType::ObjectId,
        Value::Date(_) => BsonType::Date,
        Value::Timestamp { .. } => BsonType::Timestamp,
        Value::Binary { .. } => BsonType::Binary,
        Value::RegExp { .. } => BsonType::RegExp,
        Value::Code { .. } => BsonType::Code,
        Value::Symbol(_) => BsonType::Symbol,
        Value::MinKey => BsonType::MinKey,
        Value::MaxKey => BsonType::MaxKey,
        Value::DBRef { .. } => BsonType::DBRef,
        Value::Document(_) => BsonType::Document,
        Value::Array(_) => BsonType::Array,
    }
}

/// Classifier with an ordered chain of semantic detectors
#[derive(Clone, Default)]
pub struct TypeClassifier {
    detectors: Vec<Arc<dyn SemanticDetector>>,
}

impl TypeClassifier {
    /// Classifier without semantic detection
    pub fn new() -> Self {
        Self::default()
    }

    /// Classifier with the detector chain selected by `config`
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            detectors: detector_chain(&config.semantic_types, &config.custom_detectors),
        }
    }

    /// First semantic type matching `value` at `path`
    pub fn semantic_type(&self, value: &Value, path: &[String]) -> Option<&str> {
        self.detectors
            .iter()
            .find(|d| d.matches(value, path))
            .map(|d| d.name())
    }

    /// Reported type name and base classification of `value`
    pub fn classify<'a>(&'a self, value: &Value, path: &[String]) -> (&'a str, BsonType) {
        let base = classify(value);
        let name = self.semantic_type(value, path).unwrap_or(base.as_str());
        (name, base)
    }

    /// Names of the installed detectors, in evaluation order
    pub fn detector_names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }
}

impl fmt::Debug for TypeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeClassifier")
            .field("detectors", &self.detector_names())
            .finish()
    }
}
