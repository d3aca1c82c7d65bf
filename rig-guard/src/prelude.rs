//! Common imports for rig-guard usage.
//!
//! ```
//! use rig_guard::prelude::*;
//! ```
//!
//! Re-exports the orchestrator, its options, the transports and the schema
//! types needed for JSON and tool-selection turns.

// Orchestration
pub use crate::config::ClientConfig;
pub use crate::orchestrator::{ChatOptions, ResponseOrchestrator};

// Messages and tools
pub use crate::message::{ChatInput, Message, Role};
pub use crate::tools::{Tool, ToolOutcome};

// Transports
pub use crate::transport::{
    CommandTransport, FlatTransport, RigTransport, ScriptedTransport, StructuredTransport,
};

// Errors
pub use crate::errors::Error;

// Schemas and redaction
pub use rig_guard_redact::RedactionConfig;
pub use rig_guard_structured::{SchemaDescriptor, Shape, StructuredSchema};

// Rig trait needed to build a RigTransport's client
pub use rig::client::CompletionClient;
