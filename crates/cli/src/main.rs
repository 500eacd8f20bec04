//! docschema - infer a schema from a sample of documents

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;

use commands::{InferArgs, SchemaFormat, handle_infer};
use output::OutputFormat;

/// Infer a schema from a JSON array or newline-delimited (Extended) JSON documents
#[derive(Parser, Debug)]
#[command(name = "docschema", version, about)]
struct Cli {
    /// Input file (reads stdin if omitted)
    input: Option<PathBuf>,

    /// Schema representation to print
    #[arg(short, long, value_enum, default_value_t = SchemaFormat::Standard)]
    format: SchemaFormat,

    /// Serialization of the printed document
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Analyze only the first N documents
    #[arg(long, value_name = "N")]
    sample: Option<usize>,

    /// Do not keep sample values
    #[arg(long)]
    no_values: bool,

    /// Detect semantic types such as e-mail addresses and GeoJSON points
    #[arg(long)]
    semantic_types: bool,

    /// Seed for value sampling
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let args = InferArgs {
        input: cli.input,
        format: cli.format,
        output: cli.output,
        sample: cli.sample,
        store_values: !cli.no_values,
        semantic_types: cli.semantic_types,
        seed: cli.seed,
    };

    handle_infer(&args).await?;
    Ok(())
}
