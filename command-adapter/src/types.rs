use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Binary name used when no explicit path is configured.
pub const DEFAULT_BINARY: &str = "ollama";

/// Placeholder replaced by the model name in argument templates.
pub const MODEL_PLACEHOLDER: &str = "{model}";

/// Placeholder replaced by the prompt in argument templates.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// How the flattened prompt reaches the subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptDelivery {
    /// Substituted into `{prompt}`, or appended as the final argument.
    #[default]
    Argument,
    /// Written to stdin, which is then closed.
    Stdin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Argument template. `{model}` and `{prompt}` are substituted per call.
    pub args: Vec<String>,
    pub prompt_delivery: PromptDelivery,
    pub timeout: Duration,
    pub cwd: Option<PathBuf>,
    /// Extra environment variables for the subprocess.
    pub env: Vec<(String, String)>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self::ollama()
    }
}

impl CommandConfig {
    /// `ollama run {model} {prompt}`.
    #[must_use]
    pub fn ollama() -> Self {
        Self {
            args: vec![
                "run".to_string(),
                MODEL_PLACEHOLDER.to_string(),
                PROMPT_PLACEHOLDER.to_string(),
            ],
            prompt_delivery: PromptDelivery::Argument,
            timeout: Duration::from_secs(300),
            cwd: None,
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_prompt_delivery(mut self, delivery: PromptDelivery) -> Self {
        self.prompt_delivery = delivery;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

/// Events streamed from the subprocess while it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEvent {
    /// One stdout line, including its trailing newline.
    Text {
        /// The text content.
        text: String,
    },
    /// One stderr line. Runners print progress spinners here.
    Diagnostic {
        /// The raw line.
        line: String,
    },
}
