//! Store-native `$jsonSchema` dialect
//!
//! Uses `bsonType` names, which the store validates natively, so no auxiliary
//! definitions are needed.

use serde_json::{Value as JsonValue, json};

use super::cancel::CancelToken;
use super::convert::{Converter, Node, Vocabulary, any_of};
use super::error::ConversionError;
use crate::inference::{BsonType, Schema, SchemaType};

/// `bsonType` alias of a base type
pub fn bson_type_alias(bson_type: BsonType) -> &'static str {
    match bson_type {
        BsonType::Null => "null",
        BsonType::Undefined => "undefined",
        BsonType::Boolean => "bool",
        BsonType::Number => "number",
        BsonType::Int32 => "int",
        BsonType::Long => "long",
        BsonType::Double => "double",
        BsonType::Decimal128 => "decimal",
        BsonType::String => "string",
        BsonType::ObjectId => "objectId",
        BsonType::Date => "date",
        BsonType::Timestamp => "timestamp",
        BsonType::Binary => "binData",
        BsonType::RegExp => "regex",
        BsonType::Code => "javascript",
        BsonType::Symbol => "symbol",
        BsonType::MinKey => "minKey",
        BsonType::MaxKey => "maxKey",
        BsonType::DBRef | BsonType::Document => "object",
        BsonType::Array => "array",
    }
}

#[derive(Debug, Default)]
pub(crate) struct MongoVocabulary;

impl Vocabulary for MongoVocabulary {
    // `required` must list at least one field in a `$jsonSchema`.
    const EMPTY_REQUIRED: bool = false;

    fn type_node(&mut self, schema_type: &SchemaType) -> Node {
        let mut node = Node::new();
        node.insert(
            "bsonType".to_string(),
            json!(bson_type_alias(schema_type.bson_type())),
        );
        node
    }

    fn union(&mut self, alternatives: Vec<Node>) -> Node {
        any_of(alternatives)
    }
}

/// Convert a schema to a `$jsonSchema` validator document
pub fn to_mongodb_json_schema(
    schema: &Schema,
    cancel: Option<&CancelToken>,
) -> Result<JsonValue, ConversionError> {
    let mut converter = Converter::new(MongoVocabulary, cancel);

    let mut root = Node::new();
    root.insert("bsonType".to_string(), json!("object"));
    converter.convert_fields(&schema.fields, &mut root)?;

    Ok(JsonValue::Object(root))
}
