//! Standard JSON Schema dialect (draft 2020-12)

use std::collections::BTreeSet;

use serde_json::{Value as JsonValue, json};

use super::JSON_SCHEMA_DRAFT;
use super::cancel::CancelToken;
use super::convert::{Converter, Node, Vocabulary, any_of};
use super::defs::{filtered_definitions, reference};
use super::error::ConversionError;
use crate::inference::{BsonType, Schema, SchemaType};

/// Vocabulary emitting `type` keywords and `$ref`s into `$defs`
#[derive(Debug, Default)]
pub(crate) struct StandardVocabulary {
    /// Definitions referenced during this conversion
    pub used: BTreeSet<&'static str>,
}

impl StandardVocabulary {
    /// Node for a base type, recording any definition it references
    pub fn base_node(&mut self, bson_type: BsonType) -> Node {
        let json_type = match bson_type {
            BsonType::Null => "null",
            BsonType::Undefined => return Node::new(),
            BsonType::Boolean => "boolean",
            BsonType::Number => "number",
            BsonType::Int32 | BsonType::Long => "integer",
            BsonType::String => "string",
            BsonType::Document => "object",
            BsonType::Array => "array",
            BsonType::Double
            | BsonType::Decimal128
            | BsonType::ObjectId
            | BsonType::Date
            | BsonType::Timestamp
            | BsonType::Binary
            | BsonType::RegExp
            | BsonType::Code
            | BsonType::Symbol
            | BsonType::MinKey
            | BsonType::MaxKey
            | BsonType::DBRef => {
                let name = bson_type.as_str();
                self.used.insert(name);
                let mut node = Node::new();
                node.insert("$ref".to_string(), JsonValue::String(reference(name)));
                return node;
            }
        };

        let mut node = Node::new();
        node.insert("type".to_string(), json!(json_type));
        node
    }
}

impl Vocabulary for StandardVocabulary {
    fn type_node(&mut self, schema_type: &SchemaType) -> Node {
        self.base_node(schema_type.bson_type())
    }

    fn union(&mut self, alternatives: Vec<Node>) -> Node {
        match leaf_type_names(&alternatives) {
            Some(names) => {
                let mut node = Node::new();
                let names = match names.as_slice() {
                    [single] => json!(single),
                    _ => json!(names),
                };
                node.insert("type".to_string(), names);
                node
            }
            None => any_of(alternatives),
        }
    }
}

/// Distinct type names when every alternative is a bare scalar `{ "type": name }`
fn leaf_type_names(alternatives: &[Node]) -> Option<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    for node in alternatives {
        if node.len() != 1 {
            return None;
        }
        let name = node.get("type").and_then(JsonValue::as_str)?;
        if matches!(name, "object" | "array") {
            return None;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    Some(names)
}

/// Convert a schema to a standard JSON Schema document
///
/// `$defs` holds only the store-native type definitions the document refers to.
pub fn to_standard_json_schema(
    schema: &Schema,
    cancel: Option<&CancelToken>,
) -> Result<JsonValue, ConversionError> {
    let mut converter = Converter::new(StandardVocabulary::default(), cancel);

    let mut root = Node::new();
    root.insert("$schema".to_string(), json!(JSON_SCHEMA_DRAFT));
    root.insert("type".to_string(), json!("object"));
    converter.convert_fields(&schema.fields, &mut root)?;
    root.insert(
        "$defs".to_string(),
        JsonValue::Object(filtered_definitions(&converter.vocabulary.used)),
    );

    Ok(JsonValue::Object(root))
}
