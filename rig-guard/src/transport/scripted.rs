//! Canned transport for tests and examples.

use super::{FlatTransport, FragmentStream, StructuredTransport};
use crate::errors::TransportError;
use crate::message::Message;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
enum Script {
    Fragments(Vec<String>),
    /// Replies with the content of the last message it was sent.
    Echo { chunk_chars: usize },
}

#[derive(Debug, Default)]
struct Recorded {
    messages: Vec<Vec<Message>>,
    prompts: Vec<String>,
    models: Vec<String>,
}

/// A transport that replays fixed fragments and records what it was sent.
///
/// Implements both [`StructuredTransport`] and [`FlatTransport`]. Clones share
/// the same recording.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    script: Script,
    fail_after: Option<(usize, String)>,
    refuse: Option<String>,
    recorded: Arc<Mutex<Recorded>>,
}

impl ScriptedTransport {
    /// Streams `fragments` in order on every call.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_script(Script::Fragments(
            fragments.into_iter().map(Into::into).collect(),
        ))
    }

    /// Echoes the last message (or the flat prompt) back in chunks of
    /// `chunk_chars` characters.
    #[must_use]
    pub fn echo(chunk_chars: usize) -> Self {
        Self::with_script(Script::Echo {
            chunk_chars: chunk_chars.max(1),
        })
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            fail_after: None,
            refuse: None,
            recorded: Arc::new(Mutex::new(Recorded::default())),
        }
    }

    /// Emits `count` fragments, then a terminal error.
    #[must_use]
    pub fn failing_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((count, message.into()));
        self
    }

    /// Fails when the stream is opened.
    #[must_use]
    pub fn refusing(mut self, message: impl Into<String>) -> Self {
        self.refuse = Some(message.into());
        self
    }

    /// Message lists received by structured calls.
    #[must_use]
    pub fn received_messages(&self) -> Vec<Vec<Message>> {
        self.lock().messages.clone()
    }

    /// Prompts received by flat calls.
    #[must_use]
    pub fn received_prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    /// Model identifiers of every call.
    #[must_use]
    pub fn models(&self) -> Vec<String> {
        self.lock().models.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn respond(&self, last: &str) -> Result<FragmentStream, TransportError> {
        if let Some(message) = &self.refuse {
            return Err(TransportError::Other(message.clone()));
        }

        let fragments = match &self.script {
            Script::Fragments(fragments) => fragments.clone(),
            Script::Echo { chunk_chars } => {
                let chars: Vec<char> = last.chars().collect();
                chars
                    .chunks(*chunk_chars)
                    .map(|chunk| chunk.iter().collect())
                    .collect()
            }
        };

        let mut items: Vec<Result<String, TransportError>> = match &self.fail_after {
            Some((count, _)) => fragments.into_iter().take(*count).map(Ok).collect(),
            None => fragments.into_iter().map(Ok).collect(),
        };
        if let Some((_, message)) = &self.fail_after {
            items.push(Err(TransportError::Other(message.clone())));
        }

        Ok(futures::stream::iter(items).boxed())
    }
}

#[async_trait]
impl StructuredTransport for ScriptedTransport {
    async fn stream_messages(
        &self,
        messages: &[Message],
        model: &str,
    ) -> Result<FragmentStream, TransportError> {
        {
            let mut recorded = self.lock();
            recorded.messages.push(messages.to_vec());
            recorded.models.push(model.to_string());
        }
        let last = messages.last().map_or("", |m| m.content.as_str());
        self.respond(last)
    }
}

#[async_trait]
impl FlatTransport for ScriptedTransport {
    async fn stream_prompt(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<FragmentStream, TransportError> {
        {
            let mut recorded = self.lock();
            recorded.prompts.push(prompt.to_string());
            recorded.models.push(model.to_string());
        }
        self.respond(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(stream: FragmentStream) -> Vec<Result<String, TransportError>> {
        stream.collect().await
    }

    #[tokio::test]
    async fn test_fragments_and_recording() {
        let transport = ScriptedTransport::new(["a", "b"]);
        let items = collect(
            transport
                .stream_messages(&[Message::user("hi")], "m1")
                .await
                .unwrap(),
        )
        .await;

        assert_eq!(items.len(), 2);
        assert_eq!(transport.received_messages(), vec![vec![Message::user("hi")]]);
        assert_eq!(transport.models(), vec!["m1"]);
    }

    #[tokio::test]
    async fn test_echo_chunks() {
        let transport = ScriptedTransport::echo(3);
        let items = collect(transport.stream_prompt("abcdefg", "m").await.unwrap()).await;
        let text: Vec<String> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(text, vec!["abc", "def", "g"]);
        assert_eq!(transport.received_prompts(), vec!["abcdefg"]);
    }

    #[tokio::test]
    async fn test_failure_after() {
        let transport = ScriptedTransport::new(["a", "b", "c"]).failing_after(1, "dropped");
        let items = collect(transport.stream_prompt("p", "m").await.unwrap()).await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(&items[1], Err(TransportError::Other(m)) if m == "dropped"));
    }

    #[tokio::test]
    async fn test_refusing() {
        let transport = ScriptedTransport::new(["a"]).refusing("no route");
        assert!(transport.stream_prompt("p", "m").await.is_err());
    }
}
