//! Shared orchestrator configuration.

use rig_guard_redact::RedactionConfig;
use std::time::Duration;

/// Default model for role-structured transports.
pub const DEFAULT_STRUCTURED_MODEL: &str = "gpt-4o-mini";

/// Default model for flat-prompt transports.
pub const DEFAULT_FLAT_MODEL: &str = "llama3.2";

/// Configuration for a [`ResponseOrchestrator`](crate::ResponseOrchestrator).
///
/// Shared by every turn the orchestrator runs. Per-call choices (model,
/// redaction, schema, token callback) live on
/// [`ChatOptions`](crate::ChatOptions) instead.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Model used when a call does not name one (None = transport default).
    pub default_model: Option<String>,

    /// Maximum execution time for flat-prompt subprocess turns.
    ///
    /// Default: 300 seconds (5 minutes)
    pub timeout: Duration,

    /// Bounded channel size for streamed fragments.
    ///
    /// Default: 100 fragments.
    pub channel_capacity: usize,

    /// Settings for the per-call redaction session.
    pub redaction: RedactionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            timeout: Duration::from_secs(300),
            channel_capacity: 100,
            redaction: RedactionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new `ClientConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `model` whenever a call does not specify one.
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_redaction(mut self, redaction: RedactionConfig) -> Self {
        self.redaction = redaction;
        self
    }
}
