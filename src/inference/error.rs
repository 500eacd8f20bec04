//! Error types for schema inference

use thiserror::Error;

/// Errors that can occur during schema inference
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Malformed Extended JSON type wrapper
    #[error("Invalid Extended JSON: {message}")]
    ExtendedJson { message: String },

    /// A top-level value offered for ingestion is not a document
    #[error("Invalid document: expected document at root, found {found}")]
    NotADocument { found: String },

    /// A document source is neither an array nor a sequence of documents
    #[error("Invalid document source: expected an array of documents, found {found}")]
    InvalidSource { found: String },

    /// A type name outside the known type taxonomy
    #[error("Unknown type name '{0}'")]
    UnknownType(String),

    /// Documents were offered after the schema was finalized
    #[error("Schema already finalized; no further documents can be ingested")]
    AlreadyFinalized,

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for InferenceError {
    fn from(e: serde_json::Error) -> Self {
        InferenceError::JsonParse(e.to_string())
    }
}

impl From<std::io::Error> for InferenceError {
    fn from(e: std::io::Error) -> Self {
        InferenceError::Io(e.to_string())
    }
}
