//! Error types.
//!
//! The scheduling core itself has no recoverable failures: misuse (stale
//! heap handles, foreign queue ids, calls off the owning thread) is a
//! programming error and panics. The only fallible surface is loading
//! configuration, which reports a [`ConfigError`].

use std::path::PathBuf;

/// Errors produced while resolving a [`TimeDomainConfig`](crate::runtime::TimeDomainConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value of the wrong shape.
    #[error("invalid value for {var}: expected {expected}, got {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value found.
        value: String,
        /// What was expected.
        expected: &'static str,
    },

    /// A config file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A config file could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;
