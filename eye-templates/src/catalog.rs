//! Fixed, in-memory set of templates an operator can choose from.

use std::collections::HashSet;

use eye_primitives::ConfigTemplate;
use tracing::debug;

use crate::builtin::{DEFAULT_TEMPLATE, builtin_templates};

/// Result alias for catalog operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors raised while assembling a catalog.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The catalog would contain no templates.
    #[error("template catalog cannot be empty")]
    Empty,

    /// Two templates share a name.
    #[error("duplicate template name: {name}")]
    Duplicate {
        /// The repeated name.
        name: String,
    },

    /// The designated default template is not part of the set.
    #[error("default template `{name}` is not in the catalog")]
    MissingDefault {
        /// Name that was requested as default.
        name: String,
    },

    /// A template failed primitive validation.
    #[error(transparent)]
    Invalid(#[from] eye_primitives::Error),

    /// External template data could not be decoded.
    #[error("failed to decode templates: {source}")]
    Decode {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

/// Ordered set of uniquely named templates with one designated default.
#[derive(Clone, Debug)]
pub struct TemplateCatalog {
    templates: Vec<ConfigTemplate>,
    default_index: usize,
}

impl TemplateCatalog {
    /// Builds a catalog from the supplied templates.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the list is empty, names repeat, a
    /// template is malformed, or `default_name` is absent.
    pub fn new(templates: Vec<ConfigTemplate>, default_name: &str) -> TemplateResult<Self> {
        if templates.is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut seen = HashSet::with_capacity(templates.len());
        for template in &templates {
            template.check()?;
            if !seen.insert(template.name()) {
                return Err(TemplateError::Duplicate {
                    name: template.name().to_owned(),
                });
            }
        }

        let default_index = templates
            .iter()
            .position(|t| t.name() == default_name)
            .ok_or_else(|| TemplateError::MissingDefault {
                name: default_name.to_owned(),
            })?;

        debug!(count = templates.len(), default = default_name, "template catalog ready");

        Ok(Self {
            templates,
            default_index,
        })
    }

    /// Returns the catalog of templates shipped with the console.
    ///
    /// # Panics
    ///
    /// Panics if the built-in set violates catalog invariants, which the test
    /// suite rules out.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(builtin_templates(), DEFAULT_TEMPLATE).expect("built-in catalog is consistent")
    }

    /// Decodes a JSON array of `{name, description, text}` objects.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Decode`] for malformed JSON and any error
    /// produced by [`TemplateCatalog::new`].
    pub fn from_json(json: &str, default_name: &str) -> TemplateResult<Self> {
        let templates: Vec<ConfigTemplate> = serde_json::from_str(json)?;
        Self::new(templates, default_name)
    }

    /// Looks up a template by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfigTemplate> {
        self.templates.iter().find(|t| t.name() == name)
    }

    /// Returns `true` when a template with the given name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the template used to seed new sessions.
    #[must_use]
    pub fn default_template(&self) -> &ConfigTemplate {
        &self.templates[self.default_index]
    }

    /// Iterates templates in display order.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigTemplate> {
        self.templates.iter()
    }

    /// Number of templates in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always `false`; catalogs are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> ConfigTemplate {
        ConfigTemplate::builder(name).text(format!("# {name}\n")).build().unwrap()
    }

    #[test]
    fn builtin_catalog_defaults_to_default() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.default_template().name(), "default");
        assert!(catalog.contains("strict"));
        assert!(!catalog.contains("paranoid"));
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = TemplateCatalog::new(vec![template("a"), template("a")], "a").unwrap_err();
        assert!(matches!(err, TemplateError::Duplicate { name } if name == "a"));
    }

    #[test]
    fn missing_default_rejected() {
        let err = TemplateCatalog::new(vec![template("a")], "b").unwrap_err();
        assert!(matches!(err, TemplateError::MissingDefault { .. }));
    }

    #[test]
    fn empty_rejected() {
        assert!(matches!(
            TemplateCatalog::new(Vec::new(), "a"),
            Err(TemplateError::Empty)
        ));
    }

    #[test]
    fn loads_from_json() {
        let json = r#"[
            {"name": "lab", "description": "Lab machines", "text": "security:\n  notification_level: \"error\"\n"},
            {"name": "kiosk", "description": "Kiosks", "text": "agent:\n"}
        ]"#;
        let catalog = TemplateCatalog::from_json(json, "kiosk").unwrap();
        assert_eq!(catalog.default_template().name(), "kiosk");
        assert_eq!(catalog.iter().map(ConfigTemplate::name).collect::<Vec<_>>(), ["lab", "kiosk"]);
    }

    #[test]
    fn json_with_bad_name_rejected() {
        let json = r#"[{"name": "", "description": "", "text": ""}]"#;
        let err = TemplateCatalog::from_json(json, "").unwrap_err();
        assert!(matches!(err, TemplateError::Invalid(_)));
    }
}
