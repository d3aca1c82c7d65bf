//! Error types for redaction.

use crate::catalog::PiiCategory;
use thiserror::Error;

/// Errors that can occur while redacting text.
#[derive(Debug, Error)]
pub enum RedactError {
    /// No unique mock value could be generated for a match.
    ///
    /// Fatal: reusing an issued mock value would corrupt an unrelated refill.
    #[error("Could not generate a unique {category} mock value after {attempts} attempts")]
    GenerationCollision {
        /// Category whose generator kept colliding.
        category: PiiCategory,
        /// Attempts made before giving up.
        attempts: usize,
    },

    /// A custom rule pattern failed to compile.
    #[error("Invalid pattern for {category}: {source}")]
    InvalidPattern {
        /// Category the pattern was meant for.
        category: PiiCategory,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },
}
