//! Configuration for redaction sessions.

/// Default number of generation attempts per match before giving up.
pub const DEFAULT_MAX_ATTEMPTS: usize = 32;

/// Configuration for a [`RedactionSession`](crate::RedactionSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedactionConfig {
    /// Maximum mock generation attempts per match (default: 32).
    pub max_attempts: usize,
    /// Seed for the mock generators. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
        }
    }
}

impl RedactionConfig {
    /// Set the maximum number of generation attempts per match.
    #[must_use]
    pub const fn with_max_attempts(mut self, max: usize) -> Self {
        self.max_attempts = max;
        self
    }

    /// Seed the generators for reproducible mock values.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
