//! Error types for schema handling.

use thiserror::Error;

/// Errors raised while building a [`SchemaDescriptor`](crate::SchemaDescriptor).
///
/// Validation failures are never errors; they are reported through
/// [`Validation`](crate::Validation).
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document is not a valid JSON Schema.
    #[error("Schema compilation failed: {0}")]
    Compile(String),

    /// A derived schema could not be converted into JSON.
    #[error("Schema serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
