//! Expanded dialect: standard JSON Schema annotated with observed statistics
//!
//! Every node, unions included, carries `x-bsonType` and `x-metadata`; a
//! union lists the aliases of its alternatives. Primitive nodes also
//! carry the sampled values as `x-sampleValues`. Unknown `x-` keywords are
//! ignored by validators, so the document still validates like the
//! standard dialect.

use serde_json::{Value as JsonValue, json};

use super::JSON_SCHEMA_DRAFT;
use super::cancel::CancelToken;
use super::convert::{Converter, Node, UnionSummary, Vocabulary, any_of};
use super::defs::filtered_definitions;
use super::error::ConversionError;
use super::mongodb::bson_type_alias;
use super::standard::StandardVocabulary;
use crate::inference::{Schema, SchemaType};
use crate::value::Value;

#[derive(Debug, Default)]
pub(crate) struct ExpandedVocabulary {
    standard: StandardVocabulary,
}

fn metadata(count: u64, probability: f64, has_duplicates: Option<bool>) -> JsonValue {
    let mut metadata = json!({
        "count": count,
        "probability": probability,
    });
    if let Some(has_duplicates) = has_duplicates {
        metadata["hasDuplicates"] = json!(has_duplicates);
    }
    metadata
}

impl Vocabulary for ExpandedVocabulary {
    fn type_node(&mut self, schema_type: &SchemaType) -> Node {
        let bson_type = schema_type.bson_type();
        let mut node = self.standard.base_node(bson_type);

        node.insert("x-bsonType".to_string(), json!(bson_type_alias(bson_type)));
        if schema_type.name() != bson_type.as_str() {
            node.insert("x-semanticType".to_string(), json!(schema_type.name()));
        }
        node.insert(
            "x-metadata".to_string(),
            metadata(
                schema_type.count(),
                schema_type.probability(),
                schema_type.has_duplicates(),
            ),
        );

        let values = schema_type.values();
        if !values.is_empty() {
            node.insert(
                "x-sampleValues".to_string(),
                JsonValue::Array(values.iter().map(Value::to_relaxed_extended_json).collect()),
            );
        }
        node
    }

    fn union(&mut self, alternatives: Vec<Node>) -> Node {
        any_of(alternatives)
    }

    fn annotate_union(
        &self,
        node: &mut Node,
        alternatives: &[&SchemaType],
        summary: UnionSummary,
    ) {
        let mut aliases: Vec<&str> = Vec::new();
        for alternative in alternatives {
            let alias = bson_type_alias(alternative.bson_type());
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
        let bson_type = match aliases.as_slice() {
            [single] => json!(single),
            _ => json!(aliases),
        };

        node.insert("x-bsonType".to_string(), bson_type);
        node.insert(
            "x-metadata".to_string(),
            metadata(summary.count, summary.probability, Some(summary.has_duplicates)),
        );
    }
}

/// Convert a schema to the expanded dialect
pub fn to_expanded_json_schema(
    schema: &Schema,
    cancel: Option<&CancelToken>,
) -> Result<JsonValue, ConversionError> {
    let mut converter = Converter::new(ExpandedVocabulary::default(), cancel);

    let mut root = Node::new();
    root.insert("$schema".to_string(), json!(JSON_SCHEMA_DRAFT));
    root.insert("type".to_string(), json!("object"));
    root.insert("x-bsonType".to_string(), json!("object"));
    root.insert("x-metadata".to_string(), metadata(schema.count, 1.0, None));
    converter.convert_fields(&schema.fields, &mut root)?;
    root.insert(
        "$defs".to_string(),
        JsonValue::Object(filtered_definitions(&converter.vocabulary.standard.used)),
    );

    Ok(JsonValue::Object(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{AnalyzerConfig, analyze_json};
    use pretty_assertions::assert_eq;

    fn convert(docs: JsonValue, config: AnalyzerConfig) -> JsonValue {
        let schema = analyze_json(docs, config).unwrap();
        to_expanded_json_schema(&schema, None).unwrap()
    }

    #[test]
    fn test_annotations_on_single_type() {
        let out = convert(
            json!([{"n": {"$numberInt": "4"}}, {"n": {"$numberInt": "4"}}]),
            AnalyzerConfig::default(),
        );
        assert_eq!(
            out["properties"]["n"],
            json!({
                "type": "integer",
                "x-bsonType": "int",
                "x-metadata": {"count": 2, "probability": 1.0, "hasDuplicates": true},
                "x-sampleValues": [4, 4]
            })
        );
        assert_eq!(out["x-metadata"], json!({"count": 2, "probability": 1.0}));
        assert_eq!(out["$defs"], json!({}));
    }

    #[test]
    fn test_union_carries_field_metadata() {
        let out = convert(
            json!([{"a": "x"}, {"a": {"$date": "2024-01-02T03:04:05.000Z"}}, {}]),
            AnalyzerConfig::default(),
        );
        let a = &out["properties"]["a"];
        let any_of = a["anyOf"].as_array().unwrap();
        assert_eq!(any_of.len(), 2);
        assert_eq!(any_of[0]["type"], "string");
        assert_eq!(any_of[1]["$ref"], "#/$defs/Date");
        assert_eq!(any_of[1]["x-bsonType"], "date");
        assert_eq!(
            any_of[1]["x-sampleValues"],
            json!([{"$date": "2024-01-02T03:04:05.000Z"}])
        );
        assert_eq!(a["x-bsonType"], json!(["string", "date"]));
        assert_eq!(a["x-metadata"]["count"], 2);
        assert_eq!(a["x-metadata"]["hasDuplicates"], false);
        assert!(out["$defs"].get("Date").is_some());
    }

    #[test]
    fn test_constant_and_container_nodes_have_no_duplicate_flag() {
        let out = convert(
            json!([{"a": null, "d": {"x": [1]}}]),
            AnalyzerConfig::builder().store_values(false).build(),
        );
        assert_eq!(
            out["properties"]["a"],
            json!({
                "type": "null",
                "x-bsonType": "null",
                "x-metadata": {"count": 1, "probability": 1.0}
            })
        );
        let x = &out["properties"]["d"]["properties"]["x"];
        assert_eq!(x["x-bsonType"], "array");
        assert!(x["x-metadata"].get("hasDuplicates").is_none());
        assert!(x["items"].get("x-sampleValues").is_none());
    }

    #[test]
    fn test_item_union_carries_element_metadata() {
        let out = convert(
            json!([{"tags": ["a", "a", 1]}, {"tags": [null]}]),
            AnalyzerConfig::default(),
        );
        let items = &out["properties"]["tags"]["items"];
        assert_eq!(items["anyOf"].as_array().unwrap().len(), 3);
        assert_eq!(items["x-bsonType"], json!(["string", "number", "null"]));
        assert_eq!(
            items["x-metadata"],
            json!({"count": 4, "probability": 1.0, "hasDuplicates": true})
        );
    }

    #[test]
    fn test_semantic_name_is_kept() {
        let out = convert(
            json!([{"email": "ada@example.com"}]),
            AnalyzerConfig::builder().semantic_types(true).build(),
        );
        assert_eq!(out["properties"]["email"]["x-semanticType"], "Email");
        assert_eq!(out["properties"]["email"]["type"], "string");
    }
}
