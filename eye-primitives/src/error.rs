//! Shared error definitions for Ultron Eye primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided deployment identifier could not be parsed.
    #[error("invalid deployment id: {source}")]
    InvalidDeploymentId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// The all-zero UUID was supplied where a deployment id was expected.
    #[error("deployment id cannot be the nil uuid")]
    NilDeploymentId,

    /// Template definition failed validation.
    #[error("invalid template `{name}`: {reason}")]
    InvalidTemplate {
        /// The offending template name (may be empty).
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}

impl Error {
    pub(crate) fn invalid_template(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
