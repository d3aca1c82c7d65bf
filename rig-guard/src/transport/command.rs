//! Flat-prompt transport over a local runner subprocess.

use super::{FlatTransport, FragmentStream};
use crate::config::ClientConfig;
use crate::errors::TransportError;
use async_trait::async_trait;
use futures::StreamExt;
use rig_guard_command::{
    CommandCli, CommandConfig, CommandError, DEFAULT_BINARY, StreamEvent, discover_command,
};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Runs each turn through a runner binary such as `ollama run {model}` and
/// streams its stdout lines.
///
/// A runner that fails after it started (non-zero exit, timeout) ends the
/// fragment stream with an error item.
#[derive(Debug, Clone)]
pub struct CommandTransport {
    cli: CommandCli,
    config: CommandConfig,
    channel_capacity: usize,
}

impl CommandTransport {
    /// Wraps an already located runner with the `ollama` argument preset.
    #[must_use]
    pub fn new(cli: CommandCli) -> Self {
        Self {
            cli,
            config: CommandConfig::ollama(),
            channel_capacity: ClientConfig::default().channel_capacity,
        }
    }

    /// Locates `ollama` (or `explicit_path`) and applies the client's timeout
    /// and channel capacity.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::ExecutableNotFound` if no runner can be found.
    pub fn discover(
        explicit_path: Option<PathBuf>,
        client: &ClientConfig,
    ) -> Result<Self, CommandError> {
        let path = discover_command(DEFAULT_BINARY, explicit_path)?;
        Ok(Self::new(CommandCli::new(path))
            .with_config(CommandConfig::ollama().with_timeout(client.timeout))
            .with_channel_capacity(client.channel_capacity))
    }

    /// Replaces the runner arguments, timeout, cwd and env.
    #[must_use]
    pub fn with_config(mut self, config: CommandConfig) -> Self {
        self.config = config;
        self
    }

    /// Bounded fragment channel size.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Access the underlying runner handle.
    #[must_use]
    pub const fn cli(&self) -> &CommandCli {
        &self.cli
    }
}

#[async_trait]
impl FlatTransport for CommandTransport {
    async fn stream_prompt(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<FragmentStream, TransportError> {
        let capacity = self.channel_capacity.max(1);
        let (event_tx, mut event_rx) = mpsc::channel::<StreamEvent>(capacity);
        let (tx, rx) = mpsc::channel::<Result<String, TransportError>>(capacity);

        let cli = self.cli.clone();
        let config = self.config.clone();
        let prompt = prompt.to_string();
        let model = model.to_string();

        tokio::spawn(async move {
            let forward_tx = tx.clone();
            let forward = async move {
                while let Some(event) = event_rx.recv().await {
                    match event {
                        StreamEvent::Text { text } => {
                            if forward_tx.send(Ok(text)).await.is_err() {
                                break;
                            }
                        }
                        StreamEvent::Diagnostic { line } => {
                            tracing::trace!(target: "rig_guard", line = %line, "Runner stderr");
                        }
                    }
                }
            };

            let (result, ()) =
                tokio::join!(cli.stream(&model, &prompt, &config, event_tx), forward);

            // Text already forwarded; only the failure is left to report.
            if let Err(e) = result {
                let _ = tx.send(Err(TransportError::from(e))).await;
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::transport::FlatTransport;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn transport(dir: &TempDir, body: &str) -> CommandTransport {
        let path = dir.path().join("runner");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        CommandTransport::new(CommandCli::new(path))
    }

    #[tokio::test]
    async fn test_lines_become_fragments() {
        let dir = TempDir::new().unwrap();
        let transport = transport(&dir, "echo \"$2 says\"\necho \"$3\"");

        let fragments: Vec<_> = transport
            .stream_prompt("hello", "llama3.2")
            .await
            .unwrap()
            .collect()
            .await;

        let text: Vec<String> = fragments.into_iter().map(Result::unwrap).collect();
        assert_eq!(text, vec!["llama3.2 says\n", "hello\n"]);
    }

    #[tokio::test]
    async fn test_failure_after_start_is_terminal_item() {
        let dir = TempDir::new().unwrap();
        let transport = transport(&dir, "echo partial\necho boom >&2\nexit 1");

        let items: Vec<_> = transport
            .stream_prompt("p", "m")
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "partial\n");
        assert!(matches!(
            items[1],
            Err(TransportError::Command(CommandError::NonZeroExit { exit_code: 1, .. }))
        ));
    }
}
