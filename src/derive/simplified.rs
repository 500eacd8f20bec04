use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::inference::{BsonType, Schema, SchemaField, SchemaType};

/// Field name to the shapes observed for it
pub type SimplifiedSchema = IndexMap<String, SimplifiedField>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedField {
    pub types: Vec<SimplifiedType>,
}

/// One observed type without statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedType {
    pub bson_type: BsonType,
    /// Element types of an array
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<SimplifiedType>>,
    /// Fields of a document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<SimplifiedSchema>,
}

/// Structure-only view of a schema; the Undefined pseudo-type is dropped
pub fn simplified_schema(schema: &Schema) -> SimplifiedSchema {
    simplify_fields(&schema.fields)
}

fn simplify_fields(fields: &[SchemaField]) -> SimplifiedSchema {
    fields
        .iter()
        .map(|field| {
            (
                field.name.clone(),
                SimplifiedField {
                    types: simplify_types(&field.types),
                },
            )
        })
        .collect()
}

fn simplify_types(types: &[SchemaType]) -> Vec<SimplifiedType> {
    types
        .iter()
        .filter(|t| t.bson_type() != BsonType::Undefined)
        .map(|t| {
            let mut simplified = SimplifiedType {
                bson_type: t.bson_type(),
                types: None,
                fields: None,
            };
            match t {
                SchemaType::Array(array) => simplified.types = Some(simplify_types(&array.types)),
                SchemaType::Document(document) => {
                    simplified.fields = Some(simplify_fields(&document.fields))
                }
                SchemaType::Constant(_) | SchemaType::Primitive(_) => {}
            }
            simplified
        })
        .collect()
}
