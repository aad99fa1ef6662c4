//! Template source for the configuration workflow.
//!
//! Ships the `default`, `strict`, and `development` agent configurations and a
//! [`TemplateCatalog`] that enforces unique names and a single default.

#![warn(missing_docs, clippy::pedantic)]

pub mod builtin;
pub mod catalog;

pub use builtin::{DEFAULT_TEMPLATE, builtin_templates};
pub use catalog::{TemplateCatalog, TemplateError, TemplateResult};
