//! Schema inference for store-native documents
//!
//! This module builds a statistical schema from a sample of documents:
//! which fields exist, how often, with which value types, and with a bounded
//! uniform sample of the observed values.
//!
//! ## Features
//!
//! - **Type classification** - Full store-native taxonomy (Int32, Long, ObjectId, Date, ...)
//! - **Semantic types** - Optional detectors such as e-mail addresses and GeoJSON points
//! - **Missing-value accounting** - Absent fields are reported as an `Undefined` type
//! - **Value sampling** - Reservoir sampling with a fixed memory bound per field and type
//!
//! ## Example
//!
//! ```rust,ignore
//! use docschema::inference::{AnalyzerConfig, SchemaAnalyzer};
//!
//! let mut analyzer = SchemaAnalyzer::with_config(AnalyzerConfig::default());
//!
//! analyzer.ingest_json(r#"{"_id": 1, "registered": true}"#)?;
//! analyzer.ingest_json(r#"{"_id": 2}"#)?;
//!
//! let schema = analyzer.finalize();
//! println!("{}", serde_json::to_string_pretty(&*schema)?);
//! ```

mod accumulator;
mod analyzer;
mod classify;
mod config;
mod error;
mod sampler;
mod semantic;
mod stream;
mod types;

pub use analyzer::SchemaAnalyzer;
pub use classify::{BsonType, TypeClassifier, classify};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder};
pub use error::InferenceError;
pub use sampler::{
    MAX_TEXT_LENGTH, Reservoir, TEXT_SAMPLE_CAPACITY, VALUE_SAMPLE_CAPACITY, truncate_text,
};
pub use semantic::{
    CustomDetectors, EmailDetector, GeoJsonDetector, SemanticDetector, SemanticTypes,
    builtin_detectors,
};
pub use stream::{analyze_documents, analyze_json, analyze_json_lines, analyze_stream, parse_schema};
pub use types::{
    ArrayType, ConstantType, DocumentType, PrimitiveType, Schema, SchemaField, SchemaType,
    TypeNames,
};
