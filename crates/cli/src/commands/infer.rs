//! The schema inference command

use std::io::Read;
use std::path::PathBuf;

use clap::ValueEnum;
use docschema::{
    AnalyzerConfig, Dialect, SchemaAccessor, Value, analyze_documents, schema_paths, schema_stats,
    simplified_schema,
};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::CliError;
use crate::output::{OutputFormat, render};

/// What to print for the inferred schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SchemaFormat {
    /// The inferred schema with all statistics
    Internal,
    /// JSON Schema draft 2020-12
    #[default]
    Standard,
    /// MongoDB `$jsonSchema` validator
    Mongodb,
    /// JSON Schema annotated with counts, probabilities and sample values
    Expanded,
    /// Every field path, one per line
    Paths,
    /// Field structure without statistics
    Simplified,
    /// Width, depth and branching factors
    Stats,
}

/// Arguments for the `infer` command
pub struct InferArgs {
    /// Input file (stdin if not provided)
    pub input: Option<PathBuf>,
    pub format: SchemaFormat,
    pub output: OutputFormat,
    /// Analyze at most this many documents
    pub sample: Option<usize>,
    pub store_values: bool,
    pub semantic_types: bool,
    pub seed: Option<u64>,
}

/// Handle the `infer` command
pub async fn handle_infer(args: &InferArgs) -> Result<(), CliError> {
    let text = read_input(args.input.as_ref())?;
    let mut documents = parse_documents(&text)?;
    if let Some(limit) = args.sample {
        documents.truncate(limit);
    }
    if documents.is_empty() {
        return Err(CliError::EmptyInput);
    }

    let mut builder = AnalyzerConfig::builder()
        .store_values(args.store_values)
        .semantic_types(args.semantic_types);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }

    eprintln!("Analyzing {} documents...", documents.len());
    let schema = analyze_documents(documents, builder.build())?;
    eprintln!("  Fields discovered: {}", schema.fields.len());

    let accessor = SchemaAccessor::new(schema);
    let schema = accessor.internal_schema();
    let output = match args.format {
        SchemaFormat::Internal => render(schema.as_ref(), args.output)?,
        SchemaFormat::Standard => {
            render(&*accessor.dialect(Dialect::Standard, None).await?, args.output)?
        }
        SchemaFormat::Mongodb => {
            render(&*accessor.dialect(Dialect::MongoDb, None).await?, args.output)?
        }
        SchemaFormat::Expanded => {
            render(&*accessor.dialect(Dialect::Expanded, None).await?, args.output)?
        }
        SchemaFormat::Paths => schema_paths(schema)
            .iter()
            .map(|path| path.join("."))
            .collect::<Vec<_>>()
            .join("\n"),
        SchemaFormat::Simplified => render(&simplified_schema(schema), args.output)?,
        SchemaFormat::Stats => render(&schema_stats(schema), args.output)?,
    };

    println!("{}", output);
    Ok(())
}

fn read_input(path: Option<&PathBuf>) -> Result<String, CliError> {
    match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| CliError::ReadInput {
            path: path.clone(),
            message: e.to_string(),
        }),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| CliError::Stdin(e.to_string()))?;
            Ok(text)
        }
    }
}

/// Documents of a JSON array, or of newline-delimited JSON
fn parse_documents(text: &str) -> Result<Vec<Value>, CliError> {
    if text.trim_start().starts_with('[') {
        debug!("Reading input as a JSON array");
        let items: Vec<JsonValue> =
            serde_json::from_str(text).map_err(docschema::InferenceError::from)?;
        return Ok(items
            .into_iter()
            .map(Value::from_extended_json)
            .collect::<Result<_, _>>()?);
    }

    debug!("Reading input as JSON lines");
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(Value::parse_extended_json)
        .collect::<Result<_, _>>()?)
}
