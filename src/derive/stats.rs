use serde::{Deserialize, Serialize};

use crate::inference::{Schema, SchemaField, SchemaType};

/// Size and shape of a schema's document tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaStats {
    /// Fields across every document level
    pub width: usize,
    /// Deepest document nesting; top-level fields are at depth 1
    pub depth: usize,
    /// Field count of every document node, largest first
    pub branching_factors: Vec<usize>,
}

pub fn schema_stats(schema: &Schema) -> SchemaStats {
    let mut stats = SchemaStats::default();
    visit_fields(&schema.fields, 1, &mut stats);
    stats.branching_factors.sort_unstable_by(|a, b| b.cmp(a));
    stats
}

fn visit_fields(fields: &[SchemaField], depth: usize, stats: &mut SchemaStats) {
    if fields.is_empty() {
        return;
    }
    stats.width += fields.len();
    stats.depth = stats.depth.max(depth);
    stats.branching_factors.push(fields.len());

    for field in fields {
        visit_types(&field.types, depth, stats);
    }
}

fn visit_types(types: &[SchemaType], depth: usize, stats: &mut SchemaStats) {
    for schema_type in types {
        match schema_type {
            SchemaType::Document(document) => visit_fields(&document.fields, depth + 1, stats),
            SchemaType::Array(array) => visit_types(&array.types, depth, stats),
            SchemaType::Constant(_) | SchemaType::Primitive(_) => {}
        }
    }
}
