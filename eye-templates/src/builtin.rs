//! Templates shipped with the console.

use eye_primitives::ConfigTemplate;

/// Name of the template seeded into a fresh workflow.
pub const DEFAULT_TEMPLATE: &str = "default";

const BUILTINS: [(&str, &str, &str); 3] = [
    (
        DEFAULT_TEMPLATE,
        "Default configuration with common AI tools",
        include_str!("../templates/default.yaml"),
    ),
    (
        "strict",
        "Strict security with minimal AI tool access",
        include_str!("../templates/strict.yaml"),
    ),
    (
        "development",
        "Development-friendly with more AI tools allowed",
        include_str!("../templates/development.yaml"),
    ),
];

/// Returns the built-in templates in display order.
///
/// # Panics
///
/// Panics if a built-in template name is invalid. The names are constant and
/// covered by tests.
#[must_use]
pub fn builtin_templates() -> Vec<ConfigTemplate> {
    BUILTINS
        .iter()
        .map(|(name, description, text)| {
            ConfigTemplate::builder(*name)
                .description(*description)
                .text(*text)
                .build()
                .expect("built-in template names are valid")
        })
        .collect()
}
