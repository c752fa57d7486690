//! Error types for lineasim.
//!
//! Only configuration problems and upstream randomness failures are
//! surfaced as errors. Capacity rejections and backpressure blocks are
//! modeled as statistics and machine states, never thrown.

use thiserror::Error;

/// Result type alias for lineasim operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all lineasim operations.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration parameter. Detected at construction time;
    /// the run is refused before the first event.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// The validated random source could not produce a passing batch.
    /// Fatal: the engine has no retry policy of its own and must not
    /// substitute a degraded source.
    #[error("Random source failure: no validated batch after {attempts} attempts")]
    RandomSource {
        /// Number of generate-and-validate attempts made.
        attempts: u32,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error is fatal to a running simulation (as opposed
    /// to refusing to start one).
    #[must_use]
    pub const fn is_run_fatal(&self) -> bool {
        matches!(self, Self::RandomSource { .. })
    }
}
