//! # rig-guard
//!
//! Structured-output recovery and reversible PII redaction for LLM turns.
//!
//! A [`ResponseOrchestrator`] wraps one provider transport and runs a turn
//! end to end:
//!
//! 1. prepends the JSON or tool-selection instructions,
//! 2. masks PII in every outbound message with realistic mock values,
//! 3. streams the answer and fires the token callback per fragment,
//! 4. restores the original values in the answer,
//! 5. recovers JSON from the free-form text and validates it.
//!
//! ## Example
//!
//! ```
//! use rig_guard::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ScriptedTransport::new(["Sure! ", r#"{"city": "Indianapolis"}"#, " thanks."]);
//! let orchestrator = ResponseOrchestrator::structured(transport);
//!
//! let schema = SchemaDescriptor::new(json!({
//!     "type": "object",
//!     "properties": {"city": {"type": "string"}}
//! }))?;
//! let value = orchestrator
//!     .json("Where was the order shipped?", ChatOptions::new().with_schema(schema))
//!     .await?;
//! assert_eq!(value, json!({"city": "Indianapolis"}));
//! # Ok(())
//! # }
//! # tokio::runtime::Runtime::new().unwrap().block_on(example()).unwrap();
//! ```
//!
//! ## Transports
//!
//! - [`RigTransport`]: role-structured, any Rig completion client
//! - [`CommandTransport`]: flat prompt, local runner subprocess
//! - [`ScriptedTransport`]: canned fragments for tests

/// Shared orchestrator configuration.
pub mod config;

/// Public error types.
pub mod errors;

/// Role-tagged messages and prompt templates.
pub mod message;

/// Turn orchestration.
pub mod orchestrator;

/// Commonly used types and traits.
pub mod prelude;

/// Callable tools and tool-selection types.
pub mod tools;

/// Provider transports.
pub mod transport;

pub use config::ClientConfig;
pub use errors::{Error, ToolError, TransportError};
pub use message::{ChatInput, Message, Role};
pub use orchestrator::{ChatOptions, ResponseOrchestrator, TokenCallback, TurnMetrics};
pub use tools::{Tool, ToolOutcome, ToolSelection};
pub use transport::{
    CommandTransport, FlatTransport, FragmentStream, Provider, RigTransport, ScriptedTransport,
    StructuredTransport,
};

pub use rig_guard_redact::{RedactionConfig, RedactionSession};
pub use rig_guard_structured::{SchemaDescriptor, Shape, StructuredSchema, Validation};
