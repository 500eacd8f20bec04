//! Dialect conversion tests

use docschema::dialect::{CancelToken, ConversionError, all_definitions};
use docschema::inference::{AnalyzerConfig, SemanticDetector, analyze_json};
use docschema::{
    Schema, Value, to_expanded_json_schema, to_mongodb_json_schema, to_standard_json_schema,
};
use jsonschema::Validator;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{Value as JsonValue, json};

fn analyze(docs: &JsonValue) -> Schema {
    analyze_json(docs.clone(), AnalyzerConfig::builder().seed(3).build()).unwrap()
}

/// Relaxed Extended JSON of every document in `docs`
fn relaxed(docs: &JsonValue) -> Vec<JsonValue> {
    docs.as_array()
        .unwrap()
        .iter()
        .map(|doc| {
            Value::from_extended_json(doc.clone())
                .unwrap()
                .to_relaxed_extended_json()
        })
        .collect()
}

fn assert_accepts_all(schema: &JsonValue, docs: &JsonValue) {
    let validator = Validator::new(schema).unwrap();
    for doc in relaxed(docs) {
        assert!(
            validator.is_valid(&doc),
            "schema rejected {doc}: {schema:#}"
        );
    }
}

fn store_native_sample() -> JsonValue {
    json!([
        {
            "_id": {"$oid": "5d505646cf6d4fe581014ab2"},
            "name": "Ada",
            "age": {"$numberInt": "36"},
            "visits": {"$numberLong": "9007199254740993"},
            "score": {"$numberDouble": "NaN"},
            "price": {"$numberDecimal": "19.99"},
            "born": {"$date": "1815-12-10T00:00:00.000Z"},
            "seen": {"$date": "2024-03-01T12:00:00.000Z"},
            "op": {"$timestamp": {"t": 1700000000, "i": 1}},
            "avatar": {"$binary": {"base64": "AQID", "subType": "00"}},
            "pattern": {"$regularExpression": {"pattern": "^a", "options": "i"}},
            "fn": {"$code": "function() {}", "$scope": {"x": 1}},
            "sym": {"$symbol": "s"},
            "low": {"$minKey": 1},
            "high": {"$maxKey": 1},
            "owner": {"$ref": "users", "$id": 7},
            "tags": ["a", {"$numberInt": "1"}, null],
            "address": {"city": "London", "geo": [-0.12, 51.5]}
        },
        {
            "_id": {"$oid": "5d505646cf6d4fe581014ab3"},
            "name": null,
            "score": 2.5,
            "tags": [],
            "address": {"city": "Paris", "zip": "75001"}
        }
    ])
}

mod standard_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_json_has_empty_defs() {
        let docs = json!([{"a": 1, "b": ["x"]}, {"a": "two", "c": {"d": true}}]);
        let out = to_standard_json_schema(&analyze(&docs), None).unwrap();
        assert_eq!(out["$defs"], json!({}));
    }

    #[test]
    fn test_single_object_id_adds_only_its_definition() {
        let docs = json!([{"a": 1, "_id": {"$oid": "5d505646cf6d4fe581014ab2"}}, {"a": 2}]);
        let out = to_standard_json_schema(&analyze(&docs), None).unwrap();

        assert_eq!(
            out["$defs"],
            json!({"ObjectId": all_definitions()["ObjectId"].clone()})
        );
        assert_eq!(out["properties"]["_id"], json!({"$ref": "#/$defs/ObjectId"}));
        assert_eq!(out["required"], json!(["a"]));
    }

    #[test]
    fn test_definitions_are_scoped_to_one_conversion() {
        let with_binary = json!([{"b": {"$binary": {"base64": "AA==", "subType": "00"}}}]);
        let without = json!([{"b": 1}]);

        let first = to_standard_json_schema(&analyze(&with_binary), None).unwrap();
        let second = to_standard_json_schema(&analyze(&without), None).unwrap();
        assert!(first["$defs"].get("Binary").is_some());
        assert_eq!(second["$defs"], json!({}));
    }

    #[test]
    fn test_store_native_sample_round_trip() {
        let docs = store_native_sample();
        let out = to_standard_json_schema(&analyze(&docs), None).unwrap();
        assert_accepts_all(&out, &docs);

        let mut referenced: Vec<&String> = out["$defs"].as_object().unwrap().keys().collect();
        referenced.sort();
        assert_eq!(
            referenced,
            vec![
                "Binary",
                "Code",
                "DBRef",
                "Date",
                "Decimal128",
                "Double",
                "MaxKey",
                "MinKey",
                "ObjectId",
                "RegExp",
                "Symbol",
                "Timestamp"
            ]
        );
    }

    struct Ident;

    impl SemanticDetector for Ident {
        fn name(&self) -> &str {
            "Ident"
        }

        fn matches(&self, _value: &Value, path: &[String]) -> bool {
            path.last().is_some_and(|p| p == "id")
        }
    }

    #[test]
    fn test_semantic_name_over_several_shapes_round_trips() {
        let docs = json!([{"id": 1}, {"id": "abc"}, {"id": [1, 2]}]);
        let schema = analyze_json(
            docs.clone(),
            AnalyzerConfig::builder().detector(Ident).seed(3).build(),
        )
        .unwrap();
        let out = to_standard_json_schema(&schema, None).unwrap();

        assert_eq!(
            out["properties"]["id"],
            json!({"anyOf": [
                {"type": "number"},
                {"type": "string"},
                {"type": "array", "items": {"type": "number"}}
            ]})
        );
        assert_accepts_all(&out, &docs);
    }

    #[test]
    fn test_round_trip_rejects_other_shapes() {
        let docs = json!([{"_id": {"$oid": "5d505646cf6d4fe581014ab2"}, "n": 1}]);
        let out = to_standard_json_schema(&analyze(&docs), None).unwrap();
        let validator = Validator::new(&out).unwrap();

        assert!(!validator.is_valid(&json!({"_id": "not-an-oid", "n": 1})));
        assert!(!validator.is_valid(&json!({"_id": {"$oid": "5d505646cf6d4fe581014ab2"}})));
    }
}

mod mongodb_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_store_native_aliases() {
        let out = to_mongodb_json_schema(&analyze(&store_native_sample()), None).unwrap();

        assert_eq!(out["bsonType"], "object");
        assert!(out.get("$schema").is_none());
        assert!(out.get("$defs").is_none());
        assert_eq!(out["required"], json!(["_id", "address", "name", "score", "tags"]));

        let alias = |name: &str| out["properties"][name]["bsonType"].clone();
        assert_eq!(alias("_id"), "objectId");
        assert_eq!(alias("age"), "int");
        assert_eq!(alias("visits"), "long");
        assert_eq!(alias("price"), "decimal");
        assert_eq!(alias("born"), "date");
        assert_eq!(alias("op"), "timestamp");
        assert_eq!(alias("avatar"), "binData");
        assert_eq!(alias("pattern"), "regex");
        assert_eq!(alias("fn"), "javascript");
        assert_eq!(alias("sym"), "symbol");
        assert_eq!(alias("low"), "minKey");
        assert_eq!(alias("high"), "maxKey");
        assert_eq!(alias("owner"), "object");

        assert_eq!(
            out["properties"]["name"],
            json!({"anyOf": [{"bsonType": "string"}, {"bsonType": "null"}]})
        );
        assert_eq!(
            out["properties"]["score"],
            json!({"anyOf": [{"bsonType": "double"}, {"bsonType": "number"}]})
        );
        assert_eq!(
            out["properties"]["address"],
            json!({
                "bsonType": "object",
                "required": ["city"],
                "properties": {
                    "city": {"bsonType": "string"},
                    "geo": {"bsonType": "array", "items": {"bsonType": "number"}},
                    "zip": {"bsonType": "string"}
                }
            })
        );
    }
}

mod expanded_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expanded_round_trip() {
        let docs = store_native_sample();
        let out = to_expanded_json_schema(&analyze(&docs), None).unwrap();
        assert_accepts_all(&out, &docs);
    }

    #[test]
    fn test_expanded_is_standard_plus_annotations() {
        let docs = json!([{"a": {"$numberLong": "1"}, "b": [true]}, {"a": "x"}]);
        let schema = analyze(&docs);
        let standard = to_standard_json_schema(&schema, None).unwrap();
        let expanded = to_expanded_json_schema(&schema, None).unwrap();

        assert_eq!(expanded["$schema"], standard["$schema"]);
        assert_eq!(expanded["required"], standard["required"]);
        assert_eq!(expanded["$defs"], standard["$defs"]);

        let a = &expanded["properties"]["a"];
        assert_eq!(a["x-metadata"], json!({"count": 2, "probability": 1.0, "hasDuplicates": false}));
        assert_eq!(a["x-bsonType"], json!(["long", "string"]));
        assert_eq!(a["anyOf"][0]["x-bsonType"], "long");
        assert_eq!(a["anyOf"][0]["x-sampleValues"], json!([1]));
        assert_eq!(a["anyOf"][1]["x-sampleValues"], json!(["x"]));

        let b = &expanded["properties"]["b"];
        assert_eq!(b["x-metadata"], json!({"count": 1, "probability": 0.5}));
        assert_eq!(b["items"]["x-sampleValues"], json!([true]));
    }
}

mod cancellation_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_dialect_honours_cancellation() {
        let schema = analyze(&store_native_sample());
        let token = CancelToken::new();
        token.cancel_with("user aborted");
        let expected = Err(ConversionError::Cancelled {
            reason: "user aborted".to_string(),
        });

        assert_eq!(to_standard_json_schema(&schema, Some(&token)), expected);
        assert_eq!(to_mongodb_json_schema(&schema, Some(&token)), expected);
        assert_eq!(to_expanded_json_schema(&schema, Some(&token)), expected);
    }

    #[test]
    fn test_live_token_does_not_interfere() {
        let schema = analyze(&store_native_sample());
        let token = CancelToken::new();
        assert_eq!(
            to_standard_json_schema(&schema, Some(&token)),
            to_standard_json_schema(&schema, None)
        );
    }
}

fn json_value() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        (-1.0e6f64..1.0e6).prop_map(|n| json!(n)),
        "[a-z]{0,3}".prop_map(JsonValue::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(JsonValue::Array),
            prop::collection::btree_map("[a-e]", inner, 0..4)
                .prop_map(|map| JsonValue::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_standard_dialect_accepts_its_sample(
        docs in prop::collection::vec(
            prop::collection::btree_map("_id|[a-e]", json_value(), 0..5)
                .prop_map(|map| JsonValue::Object(map.into_iter().collect())),
            1..10,
        )
    ) {
        let docs = JsonValue::Array(docs);
        let out = to_standard_json_schema(&analyze(&docs), None).unwrap();
        let validator = Validator::new(&out).unwrap();
        for doc in relaxed(&docs) {
            prop_assert!(validator.is_valid(&doc), "rejected {}", doc);
        }
    }
}
