//! Projections over a finalized [`Schema`](crate::inference::Schema)

mod paths;
mod simplified;
mod stats;

pub use paths::schema_paths;
pub use simplified::{SimplifiedField, SimplifiedSchema, SimplifiedType, simplified_schema};
pub use stats::{SchemaStats, schema_stats};
