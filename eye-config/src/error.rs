//! Error types for settings loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors emitted while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value was present but malformed.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable or field name.
        key: String,
        /// Parser message.
        reason: String,
    },
    /// Settings file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was requested.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },
    /// Settings file was not valid JSON or had unknown fields.
    #[error("failed to parse settings: {source}")]
    Parse {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

/// Result alias for settings operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
