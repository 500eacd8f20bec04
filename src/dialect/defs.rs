//! Reusable definitions for store-native types
//!
//! Each definition validates the relaxed Extended JSON encoding of one type
//! that plain JSON cannot express. Converters reference these through
//! `#/$defs/<Name>` and emit only the ones they used.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde_json::{Map, Value as JsonValue, json};

use crate::inference::BsonType;

static DEFINITIONS: Lazy<Map<String, JsonValue>> = Lazy::new(|| {
    let mut defs = Map::new();
    defs.insert(
        "Double".to_string(),
        json!({
            "anyOf": [
                { "type": "number" },
                wrapper("$numberDouble", json!({ "enum": ["Infinity", "-Infinity", "NaN"] })),
            ]
        }),
    );
    defs.insert(
        "Decimal128".to_string(),
        wrapper("$numberDecimal", json!({ "type": "string" })),
    );
    defs.insert(
        "ObjectId".to_string(),
        wrapper(
            "$oid",
            json!({ "type": "string", "pattern": "^[0-9a-fA-F]{24}$" }),
        ),
    );
    defs.insert(
        "Date".to_string(),
        wrapper(
            "$date",
            json!({
                "anyOf": [
                    { "type": "string", "format": "date-time" },
                    wrapper("$numberLong", json!({ "type": "string" })),
                ]
            }),
        ),
    );
    defs.insert(
        "Timestamp".to_string(),
        wrapper(
            "$timestamp",
            json!({
                "type": "object",
                "required": ["t", "i"],
                "properties": {
                    "t": { "type": "integer", "minimum": 0 },
                    "i": { "type": "integer", "minimum": 0 }
                },
                "additionalProperties": false
            }),
        ),
    );
    defs.insert(
        "Binary".to_string(),
        wrapper(
            "$binary",
            json!({
                "type": "object",
                "required": ["base64", "subType"],
                "properties": {
                    "base64": { "type": "string", "contentEncoding": "base64" },
                    "subType": { "type": "string", "pattern": "^[0-9a-fA-F]{1,2}$" }
                },
                "additionalProperties": false
            }),
        ),
    );
    defs.insert(
        "RegExp".to_string(),
        wrapper(
            "$regularExpression",
            json!({
                "type": "object",
                "required": ["pattern", "options"],
                "properties": {
                    "pattern": { "type": "string" },
                    "options": { "type": "string" }
                },
                "additionalProperties": false
            }),
        ),
    );
    defs.insert(
        "Code".to_string(),
        json!({
            "type": "object",
            "required": ["$code"],
            "properties": {
                "$code": { "type": "string" },
                "$scope": { "type": "object" }
            },
            "additionalProperties": false
        }),
    );
    defs.insert(
        "Symbol".to_string(),
        wrapper("$symbol", json!({ "type": "string" })),
    );
    defs.insert("MinKey".to_string(), wrapper("$minKey", json!({ "const": 1 })));
    defs.insert("MaxKey".to_string(), wrapper("$maxKey", json!({ "const": 1 })));
    defs.insert(
        "DBRef".to_string(),
        json!({
            "type": "object",
            "required": ["$ref", "$id"],
            "properties": {
                "$ref": { "type": "string" },
                "$id": {},
                "$db": { "type": "string" }
            },
            "additionalProperties": true
        }),
    );
    defs
});

/// Single-key wrapper object `{ key: <inner> }`
fn wrapper(key: &str, inner: JsonValue) -> JsonValue {
    json!({
        "type": "object",
        "required": [key],
        "properties": { key: inner },
        "additionalProperties": false
    })
}

/// Name of the shared definition describing `bson_type`, if it needs one
pub fn definition_name(bson_type: BsonType) -> Option<&'static str> {
    match bson_type {
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
        | BsonType::DBRef => Some(bson_type.as_str()),
        BsonType::Null
        | BsonType::Undefined
        | BsonType::Boolean
        | BsonType::Number
        | BsonType::Int32
        | BsonType::Long
        | BsonType::String
        | BsonType::Document
        | BsonType::Array => None,
    }
}

/// The full definitions table
pub fn all_definitions() -> &'static Map<String, JsonValue> {
    &DEFINITIONS
}

/// `$ref` target for a definition name
pub fn reference(name: &str) -> String {
    format!("#/$defs/{name}")
}

/// Only the definitions named in `used`
pub fn filtered_definitions(used: &BTreeSet<&str>) -> Map<String, JsonValue> {
    DEFINITIONS
        .iter()
        .filter(|(name, _)| used.contains(name.as_str()))
        .map(|(name, def)| (name.clone(), def.clone()))
        .collect()
}
