//! Finalized schema model
//!
//! These types are produced once by [`SchemaAnalyzer::finalize`] and are
//! read-only afterwards; every dialect converter and derivation reads them.
//!
//! [`SchemaAnalyzer::finalize`]: super::SchemaAnalyzer::finalize

use serde::{Deserialize, Serialize};

use super::classify::BsonType;
use crate::value::Value;

/// Inferred schema of a document sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Number of documents analyzed
    pub count: u64,
    pub fields: Vec<SchemaField>,
}

/// Reported type of a field: a single name, or every observed name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeNames {
    Single(String),
    Many(Vec<String>),
}

impl TypeNames {
    pub fn names(&self) -> Vec<&str> {
        match self {
            TypeNames::Single(name) => vec![name.as_str()],
            TypeNames::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// One field of a document level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaField {
    pub name: String,
    pub path: Vec<String>,
    /// Documents (or array elements) in which the field was present
    pub count: u64,
    #[serde(rename = "type")]
    pub type_names: TypeNames,
    pub probability: f64,
    pub has_duplicates: bool,
    pub types: Vec<SchemaType>,
}

impl SchemaField {
    /// Present in every enclosing document
    pub fn is_required(&self) -> bool {
        self.probability >= 1.0
    }

    /// The synthesized Undefined entry, if the field is sometimes absent
    pub fn undefined(&self) -> Option<&SchemaType> {
        self.types
            .iter()
            .find(|t| t.bson_type() == BsonType::Undefined)
    }
}

/// One observed type of a field or array element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SchemaType {
    Constant(ConstantType),
    Primitive(PrimitiveType),
    Array(ArrayType),
    Document(DocumentType),
}

/// Null and Undefined: every value is the same
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantType {
    pub name: String,
    pub bson_type: BsonType,
    pub path: Vec<String>,
    pub count: u64,
    pub probability: f64,
    /// 1 when observed at all, else 0
    pub unique: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveType {
    pub name: String,
    pub bson_type: BsonType,
    pub path: Vec<String>,
    pub count: u64,
    pub probability: f64,
    /// Distinct sampled values, compared by canonical form
    pub unique: u64,
    pub has_duplicates: bool,
    /// Bounded uniform sample of observed values
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayType {
    pub name: String,
    pub bson_type: BsonType,
    pub path: Vec<String>,
    pub count: u64,
    pub probability: f64,
    /// Length of every observed array
    pub lengths: Vec<u64>,
    /// Sum of `lengths`
    pub total_count: u64,
    pub average_length: f64,
    /// Element types, relative to `total_count`
    pub types: Vec<SchemaType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentType {
    pub name: String,
    pub bson_type: BsonType,
    pub path: Vec<String>,
    pub count: u64,
    pub probability: f64,
    pub fields: Vec<SchemaField>,
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::Constant(t) => &t.name,
            SchemaType::Primitive(t) => &t.name,
            SchemaType::Array(t) => &t.name,
            SchemaType::Document(t) => &t.name,
        }
    }

    pub fn bson_type(&self) -> BsonType {
        match self {
            SchemaType::Constant(t) => t.bson_type,
            SchemaType::Primitive(t) => t.bson_type,
            SchemaType::Array(t) => t.bson_type,
            SchemaType::Document(t) => t.bson_type,
        }
    }

    pub fn path(&self) -> &[String] {
        match self {
            SchemaType::Constant(t) => &t.path,
            SchemaType::Primitive(t) => &t.path,
            SchemaType::Array(t) => &t.path,
            SchemaType::Document(t) => &t.path,
        }
    }

    pub fn count(&self) -> u64 {
        match self {
            SchemaType::Constant(t) => t.count,
            SchemaType::Primitive(t) => t.count,
            SchemaType::Array(t) => t.count,
            SchemaType::Document(t) => t.count,
        }
    }

    pub fn probability(&self) -> f64 {
        match self {
            SchemaType::Constant(t) => t.probability,
            SchemaType::Primitive(t) => t.probability,
            SchemaType::Array(t) => t.probability,
            SchemaType::Document(t) => t.probability,
        }
    }

    /// Duplicate flag; only primitives carry one
    pub fn has_duplicates(&self) -> Option<bool> {
        match self {
            SchemaType::Primitive(t) => Some(t.has_duplicates),
            _ => None,
        }
    }

    /// Sampled values; empty for non-primitives
    pub fn values(&self) -> &[Value] {
        match self {
            SchemaType::Primitive(t) => &t.values,
            _ => &[],
        }
    }
}

impl Schema {
    /// Top-level field by name
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl SchemaField {
    /// Observed type by reported name
    pub fn type_named(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().find(|t| t.name() == name)
    }
}

impl ArrayType {
    pub fn type_named(&self, name: &str) -> Option<&SchemaType> {
        self.types.iter().find(|t| t.name() == name)
    }
}

impl DocumentType {
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names_serialize_untagged() {
        assert_eq!(
            serde_json::to_value(TypeNames::Single("String".into())).unwrap(),
            json!("String")
        );
        assert_eq!(
            serde_json::to_value(TypeNames::Many(vec!["Boolean".into(), "Undefined".into()]))
                .unwrap(),
            json!(["Boolean", "Undefined"])
        );
    }

    #[test]
    fn test_schema_type_is_tagged_by_kind() {
        let constant = SchemaType::Constant(ConstantType {
            name: "Null".into(),
            bson_type: BsonType::Null,
            path: vec!["a".into()],
            count: 2,
            probability: 1.0,
            unique: 1,
        });
        let json = serde_json::to_value(&constant).unwrap();
        assert_eq!(json["kind"], "constant");
        assert_eq!(json["bsonType"], "Null");

        let back: SchemaType = serde_json::from_value(json).unwrap();
        assert_eq!(back, constant);
        assert_eq!(back.has_duplicates(), None);
        assert!(back.values().is_empty());
    }
}
