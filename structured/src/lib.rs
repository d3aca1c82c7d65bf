//! Structured-output recovery for language model responses.
//!
//! Models return free text that only approximately contains a JSON payload.
//! This crate provides the two pieces needed to get typed data back out:
//!
//! - [`extract`] - recovers the first parseable JSON object or array from noisy text
//! - [`SchemaDescriptor`] - wraps a JSON Schema, classifies its [`Shape`], renders it
//!   for prompting and validates values against it
//!
//! ```
//! use rig_guard_structured::{extract, Shape};
//! use serde_json::json;
//!
//! let answer = "Sure! {\"city\": \"Indianapolis\"} thanks.";
//! assert_eq!(extract(answer, Shape::Object), Some(json!({"city": "Indianapolis"})));
//! ```

pub mod error;
pub mod extractor;
pub mod feedback;
pub mod schema;

pub use error::SchemaError;
pub use extractor::{extract, Shape};
pub use feedback::{collect_validation_errors, preview};
pub use schema::{SchemaDescriptor, StructuredSchema, Validation};
