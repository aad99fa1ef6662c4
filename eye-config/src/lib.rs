//! Configuration management for Ultron Eye sessions.
//!
//! Settings come from `ULTRON_*` environment variables or a JSON file, with
//! the dashboard's timings as defaults.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{ENV_PREFIX, WorkflowSettings};
