//! Observability setup for Ultron Eye binaries.
//!
//! Libraries in this workspace only emit `tracing` events; binaries call
//! [`init`] once to install a formatted subscriber.

#![warn(missing_docs, clippy::pedantic)]

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Default filter applied when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The fallback directive could not be parsed.
    #[error("invalid log filter `{directive}`: {reason}")]
    InvalidFilter {
        /// Directive that failed to parse.
        directive: String,
        /// Parser message.
        reason: String,
    },
    /// Another global subscriber is already installed.
    #[error("tracing subscriber already installed: {reason}")]
    AlreadyInstalled {
        /// Message from `tracing-subscriber`.
        reason: String,
    },
}

/// Resolves the filter: `RUST_LOG` wins, otherwise `fallback`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] when `fallback` is malformed.
pub fn filter_from_env(fallback: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(fallback).map_err(|err| TelemetryError::InvalidFilter {
        directive: fallback.to_owned(),
        reason: err.to_string(),
    })
}

/// Installs a global `fmt` subscriber filtered by `RUST_LOG` or `fallback`.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the filter is invalid or a subscriber is
/// already set.
pub fn init(fallback: &str) -> Result<(), TelemetryError> {
    let filter = filter_from_env(fallback)?;
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled {
            reason: err.to_string(),
        })
}
