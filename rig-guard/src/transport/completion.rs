//! Role-structured transport over any Rig completion client.

use super::{FragmentStream, StructuredTransport};
use crate::errors::TransportError;
use crate::message::{Message, Role};
use async_trait::async_trait;
use futures::StreamExt;
use rig::client::CompletionClient;
use rig::completion::CompletionModel;
use rig::streaming::StreamedAssistantContent;

/// Streams completions from a Rig [`CompletionClient`].
///
/// Per turn:
/// - system messages are joined into the preamble,
/// - the last non-system message is the prompt,
/// - everything else is chat history.
///
/// Only text deltas are forwarded as fragments; reasoning, tool-call and
/// final-response items are dropped.
#[derive(Clone)]
pub struct RigTransport<C> {
    client: C,
}

impl<C> RigTransport<C>
where
    C: CompletionClient + Send + Sync,
{
    /// Wraps a configured Rig client, e.g. `rig::providers::openai::Client`.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Access the underlying client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }
}

struct Split {
    preamble: Option<String>,
    history: Vec<rig::completion::Message>,
    prompt: rig::completion::Message,
}

fn split(messages: &[Message]) -> Result<Split, TransportError> {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();
    let mut rest: Vec<rig::completion::Message> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .cloned()
        .map(Into::into)
        .collect();

    let prompt = rest.pop().ok_or_else(|| {
        TransportError::Other("at least one user or assistant message is required".to_string())
    })?;

    Ok(Split {
        preamble: (!system.is_empty()).then(|| system.join("\n")),
        history: rest,
        prompt,
    })
}

#[async_trait]
impl<C> StructuredTransport for RigTransport<C>
where
    C: CompletionClient + Send + Sync + 'static,
{
    async fn stream_messages(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<FragmentStream, TransportError> {
        let Split {
            preamble,
            history,
            prompt,
        } = split(messages)?;

        let completion_model = self.client.completion_model(model);
        let mut request = completion_model.completion_request(prompt).messages(history);
        if let Some(preamble) = preamble {
            request = request.preamble(preamble);
        }

        let response = request.stream().await?;

        let fragments = response.filter_map(|chunk| async move {
            match chunk {
                Ok(StreamedAssistantContent::Text(text)) => Some(Ok(text.text)),
                Ok(_) => None,
                Err(e) => Some(Err(TransportError::from(e))),
            }
        });

        Ok(fragments.boxed())
    }
}
