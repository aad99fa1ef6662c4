//! Core shared types for the Ultron Eye configuration workflow.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod template;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifier attached to deployment requests.
pub use ids::DeploymentId;
/// Named configuration templates and their builder.
pub use template::{ConfigTemplate, ConfigTemplateBuilder};
