//! Schema aggregation over a document stream

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use super::accumulator::{
    FieldAccumulator, FieldMap, RootAccumulator, TypeAccumulator, TypeMap, TypeShape,
    finalize_fields,
};
use super::classify::TypeClassifier;
use super::config::AnalyzerConfig;
use super::error::InferenceError;
use super::sampler::{MAX_TEXT_LENGTH, truncate_text};
use super::types::Schema;
use crate::value::{Document, Value};

#[derive(Debug)]
enum State {
    Accumulating(RootAccumulator),
    Finalized(Arc<Schema>),
}

/// Schema aggregator
///
/// Documents are ingested one at a time; [`finalize`](Self::finalize) freezes
/// the accumulated counts into an immutable [`Schema`].
#[derive(Debug)]
pub struct SchemaAnalyzer {
    classifier: TypeClassifier,
    store_values: bool,
    rng: StdRng,
    state: State,
}

impl Default for SchemaAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaAnalyzer {
    /// Create a new analyzer with default configuration
    pub fn new() -> Self {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Create a new analyzer with custom configuration
    pub fn with_config(config: AnalyzerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            classifier: TypeClassifier::from_config(&config),
            store_values: config.store_values,
            rng,
            state: State::Accumulating(RootAccumulator::default()),
        }
    }

    /// Add a single document for analysis
    ///
    /// A root shaped like a DBRef is analyzed as the document it is.
    pub fn ingest(&mut self, value: &Value) -> Result<(), InferenceError> {
        let Some(document) = value.to_document() else {
            return Err(InferenceError::NotADocument {
                found: value.kind_label().to_string(),
            });
        };
        self.ingest_document(&document)
    }

    /// Add a single document for analysis
    pub fn ingest_document(&mut self, document: &Document) -> Result<(), InferenceError> {
        let State::Accumulating(root) = &mut self.state else {
            return Err(InferenceError::AlreadyFinalized);
        };

        root.count += 1;
        let mut ingest = Ingest {
            classifier: &self.classifier,
            rng: &mut self.rng,
            store_values: self.store_values,
        };
        ingest.add_fields(&mut root.fields, document, &[]);
        Ok(())
    }

    /// Parse one Extended JSON document and add it for analysis
    pub fn ingest_json(&mut self, json: &str) -> Result<(), InferenceError> {
        let value = Value::parse_extended_json(json)?;
        self.ingest(&value)
    }

    /// Number of documents ingested so far
    pub fn document_count(&self) -> u64 {
        match &self.state {
            State::Accumulating(root) => root.count,
            State::Finalized(schema) => schema.count,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, State::Finalized(_))
    }

    /// Freeze the accumulated counts into a schema
    ///
    /// Calling this again returns the same schema; no further documents can
    /// be ingested afterwards.
    pub fn finalize(&mut self) -> Arc<Schema> {
        let root = match &mut self.state {
            State::Finalized(schema) => return Arc::clone(schema),
            State::Accumulating(root) => std::mem::take(root),
        };

        let schema = Arc::new(Schema {
            count: root.count,
            fields: finalize_fields(root.fields, root.count),
        });
        debug!(
            documents = schema.count,
            fields = schema.fields.len(),
            "Finalized schema"
        );

        self.state = State::Finalized(Arc::clone(&schema));
        schema
    }

    /// Finalize and take ownership of the schema
    pub fn into_schema(mut self) -> Schema {
        Arc::unwrap_or_clone(self.finalize())
    }
}

/// Borrowed state for walking one document
struct Ingest<'a> {
    classifier: &'a TypeClassifier,
    rng: &'a mut StdRng,
    store_values: bool,
}

impl Ingest<'_> {
    fn add_fields(&mut self, fields: &mut FieldMap, document: &Document, parent_path: &[String]) {
        for (key, value) in document {
            // An explicit undefined is an omitted field.
            if matches!(value, Value::Undefined) {
                continue;
            }

            let index = match fields.get_index_of(key) {
                Some(index) => index,
                None => {
                    fields
                        .insert_full(key.clone(), FieldAccumulator::new(key, parent_path))
                        .0
                }
            };
            let FieldAccumulator {
                path, count, types, ..
            } = &mut fields[index];
            *count += 1;
            self.add_type(types, value, path);
        }
    }

    fn add_type(&mut self, types: &mut TypeMap, value: &Value, path: &[String]) {
        let classifier = self.classifier;
        let (name, bson_type) = classifier.classify(value, path);
        let store_values = self.store_values;

        let TypeAccumulator {
            path, count, shape, ..
        } = types
            .entry((name.to_string(), bson_type))
            .or_insert_with(|| TypeAccumulator::new(name, bson_type, path, store_values));
        *count += 1;

        match (shape, value) {
            (TypeShape::Array { types, lengths }, Value::Array(items)) => {
                lengths.push(items.len() as u64);
                for item in items {
                    self.add_type(types, item, path);
                }
            }
            (TypeShape::Document(fields), Value::Document(document)) => {
                self.add_fields(fields, document, path);
            }
            (TypeShape::Primitive(Some(reservoir)), value) => {
                reservoir.offer_with(|| sample_value(value), &mut *self.rng);
            }
            _ => {}
        }
    }
}

/// Copy of `value` as stored in a sampler
fn sample_value(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(truncate_text(text, MAX_TEXT_LENGTH).into_owned()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::classify::BsonType;
    use crate::inference::types::SchemaType;
    use serde_json::json;

    fn analyze(docs: serde_json::Value) -> Schema {
        let mut analyzer = SchemaAnalyzer::with_config(AnalyzerConfig::builder().seed(42).build());
        let serde_json::Value::Array(docs) = docs else {
            panic!("Expected array of documents");
        };
        for doc in docs {
            analyzer
                .ingest(&Value::from_extended_json(doc).unwrap())
                .unwrap();
        }
        analyzer.into_schema()
    }

    #[test]
    fn test_optional_field_gets_undefined() {
        let schema = analyze(json!([{"_id": 1, "registered": true}, {"_id": 2}]));

        assert_eq!(schema.count, 2);
        let registered = schema.field("registered").unwrap();
        assert_eq!(registered.probability, 0.5);
        assert_eq!(registered.types.len(), 2);
        assert_eq!(registered.types[0].name(), "Boolean");
        assert_eq!(registered.types[0].probability(), 0.5);
        assert_eq!(registered.types[1].name(), "Undefined");
        assert_eq!(registered.types[1].probability(), 0.5);

        let id = schema.field("_id").unwrap();
        assert!(id.is_required());
        assert!(id.undefined().is_none());
    }

    #[test]
    fn test_polymorphic_field_and_array_elements() {
        let schema = analyze(json!([
            {"x": [1, 2, 3]},
            {"x": "foo"},
            {"x": {"b": 1}},
            {"x": ["bar", null, false]},
            {"x": [{"c": 1, "d": 1}, {"c": 2}]},
            {"e": 1}
        ]));

        assert_eq!(schema.count, 6);
        let x = schema.field("x").unwrap();
        let distribution: Vec<(&str, f64)> =
            x.types.iter().map(|t| (t.name(), t.probability())).collect();
        assert_eq!(
            distribution,
            vec![
                ("Array", 3.0 / 6.0),
                ("String", 1.0 / 6.0),
                ("Document", 1.0 / 6.0),
                ("Undefined", 1.0 / 6.0),
            ]
        );

        let Some(SchemaType::Array(array)) = x.type_named("Array") else {
            panic!("Expected array type");
        };
        assert_eq!(array.lengths, vec![3, 3, 2]);
        assert_eq!(array.total_count, 8);
        assert_eq!(array.average_length, 8.0 / 3.0);

        let elements: Vec<(&str, f64)> = array
            .types
            .iter()
            .map(|t| (t.name(), t.probability()))
            .collect();
        assert_eq!(
            elements,
            vec![
                ("Number", 3.0 / 8.0),
                ("Document", 2.0 / 8.0),
                ("String", 1.0 / 8.0),
                ("Null", 1.0 / 8.0),
                ("Boolean", 1.0 / 8.0),
            ]
        );

        // Fields of array-element documents are relative to the element count.
        let Some(SchemaType::Document(element)) = array.type_named("Document") else {
            panic!("Expected document element type");
        };
        assert_eq!(element.field("c").unwrap().probability, 1.0);
        assert_eq!(element.field("d").unwrap().probability, 0.5);
        assert_eq!(element.field("d").unwrap().path, vec!["x", "d"]);
    }

    #[test]
    fn test_sampler_capacity_for_many_values() {
        let mut analyzer = SchemaAnalyzer::with_config(AnalyzerConfig::builder().seed(1).build());
        for i in 0..11_112i64 {
            let mut doc = Document::new();
            doc.insert("n".into(), Value::from(i));
            analyzer.ingest_document(&doc).unwrap();
        }
        let schema = analyzer.finalize();

        let number = &schema.field("n").unwrap().types[0];
        assert_eq!(number.bson_type(), BsonType::Number);
        assert_eq!(number.count(), 11_112);
        assert_eq!(number.values().len(), 10_000);
        let Some(SchemaType::Primitive(primitive)) = schema.field("n").map(|f| &f.types[0]) else {
            panic!("Expected primitive type");
        };
        assert_eq!(primitive.unique, 10_000);
        assert!(primitive.has_duplicates);
    }

    #[test]
    fn test_duplicate_values() {
        let schema = analyze(json!([{"a": "x"}, {"a": "x"}, {"a": "y"}, {"b": 1}, {"b": 2}]));

        let a = schema.field("a").unwrap();
        assert!(a.has_duplicates);
        let Some(SchemaType::Primitive(text)) = a.type_named("String") else {
            panic!("Expected string type");
        };
        assert_eq!(text.unique, 2);
        assert_eq!(text.values.len(), 3);

        assert!(!schema.field("b").unwrap().has_duplicates);
    }

    #[test]
    fn test_null_is_constant() {
        let schema = analyze(json!([{"a": null}, {"a": null}]));
        let Some(SchemaType::Constant(null)) = schema.field("a").unwrap().type_named("Null") else {
            panic!("Expected constant type");
        };
        assert_eq!(null.count, 2);
        assert_eq!(null.unique, 1);
        assert!(!schema.field("a").unwrap().has_duplicates);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut analyzer = SchemaAnalyzer::new();
        analyzer.ingest_json(r#"{"a": 1, "b": [true]}"#).unwrap();

        let first = analyzer.finalize();
        let second = analyzer.finalize();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            serde_json::to_string(&*first).unwrap(),
            serde_json::to_string(&*second).unwrap()
        );
        assert!(analyzer.is_finalized());
        assert_eq!(
            analyzer.ingest_json(r#"{"a": 2}"#),
            Err(InferenceError::AlreadyFinalized)
        );
        assert_eq!(analyzer.document_count(), 1);
    }

    #[test]
    fn test_rejects_non_documents() {
        let mut analyzer = SchemaAnalyzer::new();
        assert_eq!(
            analyzer.ingest(&Value::from("text")),
            Err(InferenceError::NotADocument {
                found: "string".to_string()
            })
        );
        assert_eq!(analyzer.document_count(), 0);
    }

    #[test]
    fn test_explicit_undefined_counts_as_missing() {
        let schema = analyze(json!([{"a": {"$undefined": true}}, {"a": 1}]));
        let a = schema.field("a").unwrap();
        assert_eq!(a.count, 1);
        assert_eq!(a.probability, 0.5);
        assert_eq!(a.undefined().map(SchemaType::count), Some(1));
    }

    #[test]
    fn test_long_text_is_truncated() {
        let mut analyzer = SchemaAnalyzer::new();
        let mut doc = Document::new();
        doc.insert("t".into(), Value::from("y".repeat(MAX_TEXT_LENGTH + 10)));
        analyzer.ingest_document(&doc).unwrap();

        let schema = analyzer.finalize();
        let sampled = schema.field("t").unwrap().types[0].values()[0].as_str().unwrap();
        assert_eq!(sampled.chars().count(), MAX_TEXT_LENGTH);
    }

    #[test]
    fn test_store_values_disabled() {
        let mut analyzer =
            SchemaAnalyzer::with_config(AnalyzerConfig::builder().store_values(false).build());
        analyzer.ingest_json(r#"{"a": 1}"#).unwrap();
        analyzer.ingest_json(r#"{"a": 1}"#).unwrap();

        let schema = analyzer.finalize();
        let Some(SchemaType::Primitive(number)) = schema.field("a").map(|f| &f.types[0]) else {
            panic!("Expected primitive type");
        };
        assert!(number.values.is_empty());
        assert_eq!(number.unique, 0);
        assert!(!number.has_duplicates);
    }

    #[test]
    fn test_semantic_type_names() {
        let mut analyzer =
            SchemaAnalyzer::with_config(AnalyzerConfig::builder().semantic_types(true).build());
        analyzer
            .ingest_json(r#"{"contact": "ada@example.com", "home": {"type": "Point", "coordinates": [-0.12, 51.5]}}"#)
            .unwrap();
        analyzer.ingest_json(r#"{"contact": "n/a"}"#).unwrap();

        let schema = analyzer.finalize();
        let contact = schema.field("contact").unwrap();
        let names: Vec<&str> = contact.types.iter().map(SchemaType::name).collect();
        assert_eq!(names, vec!["Email", "String"]);
        assert_eq!(contact.types[0].bson_type(), BsonType::String);

        let home = schema.field("home").unwrap();
        assert_eq!(home.types[0].name(), "GeoJSON");
        assert_eq!(home.types[0].bson_type(), BsonType::Document);
    }

    #[test]
    fn test_dbref_shaped_root_is_a_document() {
        let schema = analyze(json!([
            {"$ref": "users", "$id": 1},
            {"$ref": "users", "$id": 2, "note": "x"}
        ]));

        assert_eq!(schema.count, 2);
        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["$id", "$ref", "note"]);
        assert_eq!(schema.field("$ref").unwrap().types[0].bson_type(), BsonType::String);
        assert_eq!(schema.field("$id").unwrap().probability, 1.0);
    }

    #[test]
    fn test_semantic_name_over_several_shapes() {
        struct Ident;

        impl crate::inference::SemanticDetector for Ident {
            fn name(&self) -> &str {
                "Ident"
            }

            fn matches(&self, _value: &Value, path: &[String]) -> bool {
                path.last().is_some_and(|p| p == "id")
            }
        }

        let mut analyzer =
            SchemaAnalyzer::with_config(AnalyzerConfig::builder().detector(Ident).seed(1).build());
        for doc in [r#"{"id": [1, 2, 3]}"#, r#"{"id": "x"}"#, r#"{"id": 4}"#] {
            analyzer.ingest_json(doc).unwrap();
        }
        let schema = analyzer.into_schema();

        let id = schema.field("id").unwrap();
        let kinds: Vec<(&str, BsonType, u64)> = id
            .types
            .iter()
            .map(|t| (t.name(), t.bson_type(), t.count()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("Ident", BsonType::Array, 1),
                ("Ident", BsonType::String, 1),
                ("Ident", BsonType::Number, 1),
            ]
        );

        let SchemaType::Array(array) = &id.types[0] else {
            panic!("Expected array type");
        };
        assert_eq!(array.lengths, vec![3]);
        assert_eq!(array.total_count, 3);
        assert_eq!(array.average_length, 3.0);
    }

    #[test]
    fn test_empty_analyzer() {
        let schema = SchemaAnalyzer::new().into_schema();
        assert_eq!(schema.count, 0);
        assert!(schema.fields.is_empty());
    }
}
