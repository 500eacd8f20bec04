use indexmap::IndexSet;

use crate::inference::{Schema, SchemaField, SchemaType};

/// Every field path, depth-first in field order
///
/// Fields of nested documents are reached through document types and through
/// arrays (of arrays) of documents. A path reachable through several types is
/// listed once, where it is first reached.
pub fn schema_paths(schema: &Schema) -> Vec<Vec<String>> {
    let mut paths = IndexSet::new();
    collect_fields(&schema.fields, &mut paths);
    paths.into_iter().collect()
}

fn collect_fields(fields: &[SchemaField], paths: &mut IndexSet<Vec<String>>) {
    for field in fields {
        paths.insert(field.path.clone());
        collect_types(&field.types, paths);
    }
}

fn collect_types(types: &[SchemaType], paths: &mut IndexSet<Vec<String>>) {
    for schema_type in types {
        match schema_type {
            SchemaType::Document(document) => collect_fields(&document.fields, paths),
            SchemaType::Array(array) => collect_types(&array.types, paths),
            SchemaType::Constant(_) | SchemaType::Primitive(_) => {}
        }
    }
}
