//! docschema - statistical schema inference for document stores
//!
//! Provides:
//! - A store-native value model read from relaxed or canonical Extended JSON
//! - Schema inference with per-field type probabilities and sampled values
//! - Conversion to standard JSON Schema, MongoDB `$jsonSchema` and an
//!   expanded, statistics-annotated JSON Schema
//! - Memoized dialect access and simple projections (paths, simplified view, stats)
//!
//! ```rust,ignore
//! use docschema::{AnalyzerConfig, analyze_json, to_standard_json_schema};
//!
//! let docs = serde_json::json!([{"_id": 1, "registered": true}, {"_id": 2}]);
//! let schema = analyze_json(docs, AnalyzerConfig::default())?;
//! let json_schema = to_standard_json_schema(&schema, None)?;
//! ```

pub mod accessor;
pub mod derive;
pub mod dialect;
pub mod inference;
pub mod value;

pub use accessor::SchemaAccessor;
pub use derive::{SchemaStats, SimplifiedSchema, schema_paths, schema_stats, simplified_schema};
pub use dialect::{
    CancelToken, ConversionError, Dialect, JSON_SCHEMA_DRAFT, to_expanded_json_schema,
    to_mongodb_json_schema, to_standard_json_schema,
};
pub use inference::{
    AnalyzerConfig, BsonType, InferenceError, Schema, SchemaAnalyzer, SchemaField, SchemaType,
    SemanticDetector, analyze_documents, analyze_json, analyze_json_lines, analyze_stream,
    parse_schema,
};
pub use value::{Document, Value};
