//! Mutable accumulation tree and its finalization
//!
//! During ingestion every field and every (field, type) pair owns a counter;
//! arrays and documents own nested maps. Finalization consumes the tree and
//! turns counters into probabilities, passing each level's total down the
//! recursion instead of keeping parent pointers.

use std::collections::HashSet;

use indexmap::IndexMap;

use super::classify::BsonType;
use super::sampler::{Reservoir, capacity_for};
use super::types::{
    ArrayType, ConstantType, DocumentType, PrimitiveType, SchemaField, SchemaType, TypeNames,
};
use crate::value::Value;

pub(crate) type FieldMap = IndexMap<String, FieldAccumulator>;
/// Keyed by reported name and base type, so a semantic name matching values
/// of different shapes keeps one accumulator per shape
pub(crate) type TypeMap = IndexMap<(String, BsonType), TypeAccumulator>;

/// Counts for the whole document stream
#[derive(Debug, Default)]
pub(crate) struct RootAccumulator {
    pub count: u64,
    pub fields: FieldMap,
}

#[derive(Debug)]
pub(crate) struct FieldAccumulator {
    pub name: String,
    pub path: Vec<String>,
    /// Documents in which the field was present
    pub count: u64,
    pub types: TypeMap,
}

#[derive(Debug)]
pub(crate) struct TypeAccumulator {
    pub name: String,
    pub bson_type: BsonType,
    pub path: Vec<String>,
    pub count: u64,
    pub shape: TypeShape,
}

/// Per-kind payload of a type accumulator
#[derive(Debug)]
pub(crate) enum TypeShape {
    Constant,
    /// `None` when value storage is disabled
    Primitive(Option<Reservoir<Value>>),
    Array { types: TypeMap, lengths: Vec<u64> },
    Document(FieldMap),
}

impl FieldAccumulator {
    pub fn new(name: &str, parent_path: &[String]) -> Self {
        let mut path = parent_path.to_vec();
        path.push(name.to_string());
        Self {
            name: name.to_string(),
            path,
            count: 0,
            types: TypeMap::new(),
        }
    }
}

impl TypeAccumulator {
    pub fn new(name: &str, bson_type: BsonType, path: &[String], store_values: bool) -> Self {
        let shape = match bson_type {
            BsonType::Null | BsonType::Undefined => TypeShape::Constant,
            BsonType::Array => TypeShape::Array {
                types: TypeMap::new(),
                lengths: Vec::new(),
            },
            BsonType::Document => TypeShape::Document(FieldMap::new()),
            _ => TypeShape::Primitive(
                store_values.then(|| Reservoir::new(capacity_for(bson_type))),
            ),
        };
        Self {
            name: name.to_string(),
            bson_type,
            path: path.to_vec(),
            count: 0,
            shape,
        }
    }
}

/// `count / divisor`, defined as 0 for an empty divisor
pub(crate) fn ratio(count: u64, divisor: u64) -> f64 {
    if divisor == 0 {
        0.0
    } else {
        count as f64 / divisor as f64
    }
}

/// Finalize the fields of one document level whose enclosing count is `parent_count`
pub(crate) fn finalize_fields(fields: FieldMap, parent_count: u64) -> Vec<SchemaField> {
    let mut finalized: Vec<SchemaField> = fields
        .into_values()
        .map(|field| field.finalize(parent_count))
        .collect();
    sort_fields(&mut finalized);
    finalized
}

impl FieldAccumulator {
    fn finalize(self, parent_count: u64) -> SchemaField {
        let types = finalize_types(self.types, parent_count, &self.path);

        let type_names = match types.as_slice() {
            [single] => TypeNames::Single(single.name().to_string()),
            _ => TypeNames::Many(types.iter().map(|t| t.name().to_string()).collect()),
        };
        let has_duplicates = types.iter().any(|t| t.has_duplicates() == Some(true));

        SchemaField {
            name: self.name,
            path: self.path,
            count: self.count,
            type_names,
            probability: ratio(self.count, parent_count),
            has_duplicates,
            types,
        }
    }
}

/// Finalize sibling types whose counts should add up to `total`
fn finalize_types(mut types: TypeMap, total: u64, path: &[String]) -> Vec<SchemaType> {
    let defined: u64 = types.values().map(|t| t.count).sum();
    if defined < total {
        let mut undefined = TypeAccumulator::new(
            BsonType::Undefined.as_str(),
            BsonType::Undefined,
            path,
            false,
        );
        undefined.count = total - defined;
        types.insert(
            (BsonType::Undefined.as_str().to_string(), BsonType::Undefined),
            undefined,
        );
    }

    let mut finalized: Vec<SchemaType> = types
        .into_values()
        .map(|t| t.finalize(total))
        .collect();
    sort_types(&mut finalized);
    finalized
}

impl TypeAccumulator {
    fn finalize(self, total: u64) -> SchemaType {
        let probability = ratio(self.count, total);
        match self.shape {
            TypeShape::Constant => SchemaType::Constant(ConstantType {
                name: self.name,
                bson_type: self.bson_type,
                path: self.path,
                count: self.count,
                probability,
                unique: u64::from(self.count > 0),
            }),
            TypeShape::Primitive(values) => {
                let (values, unique, has_duplicates) = match values {
                    Some(reservoir) => {
                        let values = reservoir.into_vec();
                        let unique = values
                            .iter()
                            .map(Value::canonical_string)
                            .collect::<HashSet<_>>()
                            .len() as u64;
                        (values, unique, unique != self.count)
                    }
                    None => (Vec::new(), 0, false),
                };
                SchemaType::Primitive(PrimitiveType {
                    name: self.name,
                    bson_type: self.bson_type,
                    path: self.path,
                    count: self.count,
                    probability,
                    unique,
                    has_duplicates,
                    values,
                })
            }
            TypeShape::Array { types, lengths } => {
                let total_count: u64 = lengths.iter().sum();
                let types = finalize_types(types, total_count, &self.path);
                SchemaType::Array(ArrayType {
                    name: self.name,
                    bson_type: self.bson_type,
                    path: self.path,
                    count: self.count,
                    probability,
                    average_length: ratio(total_count, self.count),
                    total_count,
                    lengths,
                    types,
                })
            }
            TypeShape::Document(fields) => SchemaType::Document(DocumentType {
                name: self.name,
                bson_type: self.bson_type,
                path: self.path,
                count: self.count,
                probability,
                fields: finalize_fields(fields, self.count),
            }),
        }
    }
}

/// `_id` first, then case-insensitive by name
fn sort_fields(fields: &mut [SchemaField]) {
    fields.sort_by(|a, b| {
        (b.name == "_id")
            .cmp(&(a.name == "_id"))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Most frequent first, Undefined always last; ties keep first-seen order
fn sort_types(types: &mut [SchemaType]) {
    types.sort_by(|a, b| {
        let a_undefined = a.bson_type() == BsonType::Undefined;
        let b_undefined = b.bson_type() == BsonType::Undefined;
        a_undefined
            .cmp(&b_undefined)
            .then_with(|| b.count().cmp(&a.count()))
    });
}
