//! CLI command handlers

pub mod infer;

pub use infer::{InferArgs, SchemaFormat, handle_infer};
