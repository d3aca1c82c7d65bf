//! Provider transports: anything that turns a turn's messages into a stream
//! of text fragments.
//!
//! | Transport | Kind | Backend |
//! |-----------|------|---------|
//! | [`RigTransport`] | structured | any Rig `CompletionClient` |
//! | [`CommandTransport`] | flat | local runner subprocess (`ollama run`) |
//! | [`ScriptedTransport`] | both | canned fragments for tests |

mod command;
mod completion;
mod scripted;

pub use command::CommandTransport;
pub use completion::RigTransport;
pub use scripted::ScriptedTransport;

use crate::config::{DEFAULT_FLAT_MODEL, DEFAULT_STRUCTURED_MODEL};
use crate::errors::TransportError;
use crate::message::Message;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;

/// Lazy, finite sequence of answer fragments.
///
/// An `Err` item is terminal.
pub type FragmentStream = BoxStream<'static, Result<String, TransportError>>;

/// A provider that accepts a role-tagged message list.
#[async_trait]
pub trait StructuredTransport: Send + Sync {
    /// Model used when neither the call nor the client config names one.
    fn default_model(&self) -> &str {
        DEFAULT_STRUCTURED_MODEL
    }

    /// Starts one streamed completion.
    async fn stream_messages(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<FragmentStream, TransportError>;
}

/// A provider that accepts one flattened prompt string.
#[async_trait]
pub trait FlatTransport: Send + Sync {
    /// Model used when neither the call nor the client config names one.
    fn default_model(&self) -> &str {
        DEFAULT_FLAT_MODEL
    }

    /// Starts one streamed generation.
    async fn stream_prompt(&self, prompt: &str, model: &str)
    -> Result<FragmentStream, TransportError>;
}

/// The transport an orchestrator drives, fixed at construction.
#[derive(Clone)]
pub enum Provider {
    /// Role-structured provider.
    Structured(Arc<dyn StructuredTransport>),
    /// Flat-prompt provider.
    Flat(Arc<dyn FlatTransport>),
}

impl Provider {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured",
            Self::Flat(_) => "flat",
        }
    }

    /// The transport's own default model.
    #[must_use]
    pub fn default_model(&self) -> &str {
        match self {
            Self::Structured(t) => t.default_model(),
            Self::Flat(t) => t.default_model(),
        }
    }

    /// Opens a fragment stream for `messages`, flattening them first for
    /// flat providers.
    pub async fn open(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<FragmentStream, TransportError> {
        match self {
            Self::Structured(t) => t.stream_messages(messages, model).await,
            Self::Flat(t) => t.stream_prompt(&flatten(messages), model).await,
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Provider").field(&self.kind()).finish()
    }
}

/// Message contents joined with `\n`, roles dropped.
#[must_use]
pub fn flatten(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten() {
        let messages = vec![
            Message::system("Be brief."),
            Message::user("What is 2 + 2?"),
        ];
        assert_eq!(flatten(&messages), "Be brief.\nWhat is 2 + 2?");
        assert_eq!(flatten(&[]), "");
    }

    #[test]
    fn test_provider_defaults() {
        let structured = Provider::Structured(Arc::new(ScriptedTransport::new(["x"])));
        let flat = Provider::Flat(Arc::new(ScriptedTransport::new(["x"])));
        assert_eq!(structured.default_model(), "gpt-4o-mini");
        assert_eq!(flat.default_model(), "llama3.2");
        assert_eq!(format!("{flat:?}"), "Provider(\"flat\")");
    }
}
