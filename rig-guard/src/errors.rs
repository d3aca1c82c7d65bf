//! Public error types for rig-guard.

use rig_guard_command::CommandError;
use rig_guard_redact::RedactError;
use rig_guard_structured::{SchemaError, Shape};
use thiserror::Error;

/// Failure reported by a provider transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Error from Rig's completion system.
    #[error("Rig completion error: {0}")]
    Completion(#[from] rig::completion::CompletionError),

    /// The local runner subprocess failed.
    #[error("Runner failed: {0}")]
    Command(#[from] CommandError),

    /// The fragment stream ended because its producer went away.
    #[error("Stream closed unexpectedly: {0}")]
    Closed(String),

    /// Any other provider-side failure.
    #[error("{0}")]
    Other(String),
}

/// Failure reported by a tool callback.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The selected arguments do not fit the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// The tool ran and failed.
    #[error("Execution error: {0}")]
    Execution(String),
}

/// Errors surfaced by [`ResponseOrchestrator`](crate::ResponseOrchestrator)
/// operations.
///
/// Every variant is terminal for the call that produced it; nothing is retried
/// internally.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider transport failed before or during streaming. No partial
    /// answer is returned.
    #[error("Failed to process chat stream: {0}")]
    StreamFailure(#[source] TransportError),

    /// A JSON turn was requested without a schema.
    #[error("A schema is required for JSON output")]
    MissingSchema,

    /// The answer contained no recoverable JSON of the expected shape, or it
    /// did not deserialize into the requested type.
    #[error("Failed to extract a JSON {shape} from the response: {reason}")]
    ExtractionFailed {
        /// Shape that was searched for.
        shape: Shape,
        /// What went wrong.
        reason: String,
    },

    /// The tool-selection answer failed the tool-selection schema.
    #[error("Invalid tools response: {0}")]
    InvalidToolSelection(String),

    /// The redactor could not issue a unique mock value.
    #[error("Redaction failed: {0}")]
    GenerationCollision(#[from] RedactError),

    /// A schema descriptor could not be built.
    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    /// A tool callback failed; remaining tools in the turn were not run.
    #[error("Tool '{tool}' failed: {source}")]
    Tool {
        /// Name of the failing tool.
        tool: String,
        /// Callback error.
        #[source]
        source: ToolError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_guard_redact::PiiCategory;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::MissingSchema.to_string(),
            "A schema is required for JSON output"
        );

        let err = Error::ExtractionFailed {
            shape: Shape::Array,
            reason: "nothing parsed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to extract a JSON array from the response: nothing parsed"
        );

        let err = Error::from(RedactError::GenerationCollision {
            category: PiiCategory::Phone,
            attempts: 32,
        });
        assert!(matches!(err, Error::GenerationCollision(_)));
        assert!(err.to_string().contains("phone mock value after 32 attempts"));
    }

    #[test]
    fn test_tool_error_keeps_source() {
        let err = Error::Tool {
            tool: "calculator".to_string(),
            source: ToolError::Execution("division by zero".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Tool 'calculator' failed: Execution error: division by zero"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
