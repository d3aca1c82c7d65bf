//! Subprocess adapter for local model runners such as `ollama`.
//!
//! The runner receives a flattened prompt (as an argument or on stdin) and
//! prints its answer as plain text. Stdout lines are streamed back as they
//! arrive.

pub mod cmd;
pub mod discovery;
pub mod error;
pub mod process;
pub mod types;

use tokio::process::Command;
use tokio::sync::mpsc;

pub use discovery::discover_command;
pub use error::CommandError;
pub use process::run_command;
pub use types::*;

/// A located runner binary.
#[derive(Debug, Clone)]
pub struct CommandCli {
    /// Absolute path to the runner executable.
    pub path: std::path::PathBuf,
}

impl CommandCli {
    /// Wraps an already located binary.
    #[must_use]
    pub const fn new(path: std::path::PathBuf) -> Self {
        Self { path }
    }

    /// Checks that the runner starts and answers `--version`.
    ///
    /// # Errors
    /// Returns an error if the binary cannot be executed or exits unsuccessfully.
    pub async fn check_health(&self) -> Result<(), CommandError> {
        let output = Command::new(&self.path).arg("--version").output().await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CommandError::HealthCheck(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }

    /// Runs the runner to completion and returns its collected output.
    pub async fn run(
        &self,
        model: &str,
        prompt: &str,
        config: &CommandConfig,
    ) -> Result<RunResult, CommandError> {
        run_command(&self.path, model, prompt, config, None).await
    }

    /// Runs the runner, forwarding stdout and stderr lines to `sender` as they arrive.
    pub async fn stream(
        &self,
        model: &str,
        prompt: &str,
        config: &CommandConfig,
        sender: mpsc::Sender<StreamEvent>,
    ) -> Result<RunResult, CommandError> {
        run_command(&self.path, model, prompt, config, Some(sender)).await
    }
}
