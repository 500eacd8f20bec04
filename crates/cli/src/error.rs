//! Error types for the CLI

use std::path::PathBuf;

use docschema::{ConversionError, InferenceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {path}: {message}")]
    ReadInput { path: PathBuf, message: String },

    #[error("Failed to read standard input: {0}")]
    Stdin(String),

    #[error("Inference error: {0}")]
    Inference(#[from] InferenceError),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Failed to serialize output: {0}")]
    Serialization(String),

    #[error("No documents found in input")]
    EmptyInput,
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
