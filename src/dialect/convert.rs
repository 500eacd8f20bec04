//! Recursive walk shared by every dialect
//!
//! A [`Vocabulary`] decides what a single type looks like in its dialect and
//! how alternatives are combined; the [`Converter`] owns the recursion over
//! fields, types, array items and nested documents.

use serde_json::{Map, Value as JsonValue};

use super::cancel::CancelToken;
use super::error::ConversionError;
use crate::inference::{ArrayType, BsonType, SchemaField, SchemaType};

pub(crate) type Node = Map<String, JsonValue>;

/// Counts of the slot a union fills: a field, or the items of an array
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct UnionSummary {
    pub count: u64,
    pub probability: f64,
    pub has_duplicates: bool,
}

impl UnionSummary {
    fn of_field(field: &SchemaField) -> Self {
        Self {
            count: field.count,
            probability: field.probability,
            has_duplicates: field.has_duplicates,
        }
    }

    fn of_items(array: &ArrayType) -> Self {
        let count: u64 = array
            .types
            .iter()
            .filter(|t| t.bson_type() != BsonType::Undefined)
            .map(SchemaType::count)
            .sum();
        let probability = if array.total_count == 0 {
            0.0
        } else {
            count as f64 / array.total_count as f64
        };
        Self {
            count,
            probability,
            has_duplicates: array.types.iter().any(|t| t.has_duplicates() == Some(true)),
        }
    }
}

pub(crate) trait Vocabulary {
    /// Emit `required: []` for documents without required fields
    const EMPTY_REQUIRED: bool = true;

    /// Node for one type, before `items` or `properties` are attached
    fn type_node(&mut self, schema_type: &SchemaType) -> Node;

    /// Combine the nodes of two or more alternative types
    fn union(&mut self, alternatives: Vec<Node>) -> Node;

    /// Decorate the union node built from `alternatives`
    fn annotate_union(
        &self,
        _node: &mut Node,
        _alternatives: &[&SchemaType],
        _summary: UnionSummary,
    ) {
    }
}

pub(crate) struct Converter<'a, V> {
    pub vocabulary: V,
    cancel: Option<&'a CancelToken>,
}

impl<'a, V: Vocabulary> Converter<'a, V> {
    pub fn new(vocabulary: V, cancel: Option<&'a CancelToken>) -> Self {
        Self {
            vocabulary,
            cancel,
        }
    }

    fn check(&self) -> Result<(), ConversionError> {
        match self.cancel {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }

    /// Attach `required` and `properties` for `fields` to `node`
    pub fn convert_fields(
        &mut self,
        fields: &[SchemaField],
        node: &mut Node,
    ) -> Result<(), ConversionError> {
        self.check()?;

        let required: Vec<JsonValue> = fields
            .iter()
            .filter(|f| f.is_required())
            .map(|f| JsonValue::String(f.name.clone()))
            .collect();

        let mut properties = Map::new();
        for field in fields {
            let property = self.convert_types(&field.types, UnionSummary::of_field(field))?;
            properties.insert(field.name.clone(), JsonValue::Object(property));
        }

        if V::EMPTY_REQUIRED || !required.is_empty() {
            node.insert("required".to_string(), JsonValue::Array(required));
        }
        node.insert("properties".to_string(), JsonValue::Object(properties));
        Ok(())
    }

    /// Node accepting any of `types`, ignoring the Undefined pseudo-type
    pub fn convert_types(
        &mut self,
        types: &[SchemaType],
        summary: UnionSummary,
    ) -> Result<Node, ConversionError> {
        self.check()?;

        let defined: Vec<&SchemaType> = types
            .iter()
            .filter(|t| t.bson_type() != BsonType::Undefined)
            .collect();

        match defined.as_slice() {
            [] => Ok(Node::new()),
            [single] => self.convert_type(single),
            several => {
                let alternatives = several
                    .iter()
                    .map(|t| self.convert_type(t))
                    .collect::<Result<Vec<_>, _>>()?;
                let mut node = self.vocabulary.union(alternatives);
                self.vocabulary.annotate_union(&mut node, several, summary);
                Ok(node)
            }
        }
    }

    /// Node for a single type, recursing into array items and document fields
    pub fn convert_type(&mut self, schema_type: &SchemaType) -> Result<Node, ConversionError> {
        self.check()?;

        let mut node = self.vocabulary.type_node(schema_type);
        match schema_type {
            SchemaType::Array(array) => {
                let items = self.convert_types(&array.types, UnionSummary::of_items(array))?;
                node.insert("items".to_string(), JsonValue::Object(items));
            }
            SchemaType::Document(document) => {
                self.convert_fields(&document.fields, &mut node)?;
            }
            SchemaType::Constant(_) | SchemaType::Primitive(_) => {}
        }
        Ok(node)
    }
}

/// Drop repeated alternatives, keeping the first occurrence
pub(crate) fn dedup_nodes(nodes: Vec<Node>) -> Vec<Node> {
    let mut unique: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        if !unique.contains(&node) {
            unique.push(node);
        }
    }
    unique
}

/// `anyOf` over `alternatives`, or the alternative itself when only one is left
pub(crate) fn any_of(alternatives: Vec<Node>) -> Node {
    let mut alternatives = dedup_nodes(alternatives);
    if alternatives.len() == 1 {
        return alternatives.remove(0);
    }
    let mut node = Node::new();
    node.insert(
        "anyOf".to_string(),
        JsonValue::Array(alternatives.into_iter().map(JsonValue::Object).collect()),
    );
    node
}
