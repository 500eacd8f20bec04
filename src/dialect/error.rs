//! Error types for dialect conversion

use thiserror::Error;

/// Errors that can occur while converting a schema to a dialect
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The conversion's cancellation token fired
    #[error("Conversion cancelled: {reason}")]
    Cancelled { reason: String },
}
