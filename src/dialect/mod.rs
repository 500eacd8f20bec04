//! Conversion of inferred schemas into external schema dialects
//!
//! - **Standard** - JSON Schema draft 2020-12 with `$ref`s into `$defs` for
//!   store-native types
//! - **MongoDB** - a `$jsonSchema` validator using `bsonType`
//! - **Expanded** - the standard dialect annotated with counts, probabilities
//!   and sampled values
//!
//! Every converter accepts an optional [`CancelToken`], checked before each
//! field, type and nested document is converted.

mod cancel;
mod convert;
mod defs;
mod error;
mod expanded;
mod mongodb;
mod standard;

pub use cancel::CancelToken;
pub use defs::{all_definitions, definition_name};
pub use error::ConversionError;
pub use expanded::to_expanded_json_schema;
pub use mongodb::{bson_type_alias, to_mongodb_json_schema};
pub use standard::to_standard_json_schema;

/// `$schema` identifier of the standard and expanded dialects
pub const JSON_SCHEMA_DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

/// Output dialect of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Standard,
    MongoDb,
    Expanded,
}
