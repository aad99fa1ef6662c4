//! Ultron Eye configuration workflow SDK facade.
//!
//! Bundles the workspace crates behind feature flags. Most consumers only need
//! [`kernel::ConfigWorkflow`], which pulls in the template catalog, validator,
//! and deployment adapters it is built from.

#![warn(missing_docs, clippy::pedantic)]

/// Shared identifiers and template types.
pub use eye_primitives as primitives;

/// Built-in template catalog (enabled by `templates` feature).
#[cfg(feature = "templates")]
pub use eye_templates as templates;

/// Line validation rules (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use eye_policy as policy;

/// Deployer and clipboard backends (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use eye_adapters as adapters;

/// Workflow settings (enabled by `config` feature).
#[cfg(feature = "config")]
pub use eye_config as config;

/// Tracing subscriber setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use eye_telemetry as telemetry;

/// Configuration workflow session (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use eye_kernel as kernel;
