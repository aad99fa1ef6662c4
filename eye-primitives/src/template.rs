//! Named configuration templates offered to operators.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const MAX_NAME_LEN: usize = 64;

/// A named agent configuration body with a short description.
///
/// The body is treated as opaque text; structure is only inspected by the
/// line-based validator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigTemplate {
    name: String,
    description: String,
    text: String,
}

impl ConfigTemplate {
    /// Starts building a [`ConfigTemplate`] with the given name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ConfigTemplateBuilder {
        ConfigTemplateBuilder {
            name: name.into(),
            description: String::new(),
            text: None,
        }
    }

    /// Returns the unique short identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable summary.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the configuration body.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Checks the invariants enforced by the builder.
    ///
    /// Deserialized templates bypass the builder, so catalogs call this after
    /// loading external data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] when the name is empty, too long, or
    /// contains whitespace.
    pub fn check(&self) -> Result<()> {
        validate_name(&self.name)
    }
}

/// Builder for [`ConfigTemplate`].
#[derive(Debug)]
pub struct ConfigTemplateBuilder {
    name: String,
    description: String,
    text: Option<String>,
}

impl ConfigTemplateBuilder {
    /// Sets the description shown next to the template name.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the configuration body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Consumes the builder and returns the template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] when the name is invalid or no body
    /// was supplied.
    pub fn build(self) -> Result<ConfigTemplate> {
        validate_name(&self.name)?;
        let text = self
            .text
            .ok_or_else(|| Error::invalid_template(&self.name, "template text must be provided"))?;

        Ok(ConfigTemplate {
            name: self.name,
            description: self.description,
            text,
        })
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_template(name, "name cannot be empty"));
    }

    if name.len() > MAX_NAME_LEN {
        return Err(Error::invalid_template(
            name,
            format!("name length must be <= {MAX_NAME_LEN}"),
        ));
    }

    if name.chars().any(char::is_whitespace) {
        return Err(Error::invalid_template(name, "name cannot contain whitespace"));
    }

    Ok(())
}
