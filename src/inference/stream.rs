//! Adapters feeding document sources into a [`SchemaAnalyzer`]

use std::io::BufRead;
use std::pin::pin;

use futures::{Stream, StreamExt};
use serde_json::Value as JsonValue;
use tracing::info;

use super::analyzer::SchemaAnalyzer;
use super::config::AnalyzerConfig;
use super::error::InferenceError;
use super::types::Schema;
use crate::accessor::SchemaAccessor;
use crate::value::Value;

/// Analyze every document of an in-memory source
pub fn analyze_documents<I>(documents: I, config: AnalyzerConfig) -> Result<Schema, InferenceError>
where
    I: IntoIterator<Item = Value>,
{
    let mut analyzer = SchemaAnalyzer::with_config(config);
    for document in documents {
        analyzer.ingest(&document)?;
    }
    Ok(finish(analyzer))
}

/// Analyze documents pulled from an asynchronous source
///
/// The first source error aborts the analysis and is returned as is.
pub async fn analyze_stream<S, E>(source: S, config: AnalyzerConfig) -> Result<Schema, E>
where
    S: Stream<Item = Result<Value, E>>,
    E: From<InferenceError>,
{
    let mut analyzer = SchemaAnalyzer::with_config(config);
    let mut source = pin!(source);
    while let Some(document) = source.next().await {
        analyzer.ingest(&document?)?;
    }
    Ok(finish(analyzer))
}

/// Analyze a JSON array of Extended JSON documents
pub fn analyze_json(json: JsonValue, config: AnalyzerConfig) -> Result<Schema, InferenceError> {
    let JsonValue::Array(items) = json else {
        return Err(InferenceError::InvalidSource {
            found: json_kind(&json).to_string(),
        });
    };

    let mut analyzer = SchemaAnalyzer::with_config(config);
    for item in items {
        analyzer.ingest(&Value::from_extended_json(item)?)?;
    }
    Ok(finish(analyzer))
}

/// Analyze newline-delimited Extended JSON, skipping blank lines
pub fn analyze_json_lines<R: BufRead>(
    reader: R,
    config: AnalyzerConfig,
) -> Result<Schema, InferenceError> {
    let mut analyzer = SchemaAnalyzer::with_config(config);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        analyzer.ingest_json(&line)?;
    }
    Ok(finish(analyzer))
}

/// Analyze documents and wrap the result for dialect conversion
pub fn parse_schema<I>(documents: I, config: AnalyzerConfig) -> Result<SchemaAccessor, InferenceError>
where
    I: IntoIterator<Item = Value>,
{
    analyze_documents(documents, config).map(SchemaAccessor::new)
}

fn finish(analyzer: SchemaAnalyzer) -> Schema {
    let schema = analyzer.into_schema();
    info!(
        documents = schema.count,
        fields = schema.fields.len(),
        "Schema analysis complete"
    );
    schema
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
