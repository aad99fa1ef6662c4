//! Forward-scanning validator built from an ordered list of line rules.

use tracing::trace;

use crate::finding::ValidationError;
use crate::rules::{LineRule, NotificationLevelRule};

/// Applies line rules to configuration text in a single forward pass.
#[derive(Debug)]
pub struct Validator {
    rules: Vec<Box<dyn LineRule>>,
}

impl Validator {
    /// Creates a validator with no rules; every text passes.
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Creates the validator used by the configuration workflow.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty().with_rule(NotificationLevelRule)
    }

    /// Appends a rule; rules run in insertion order on each line.
    #[must_use]
    pub fn with_rule(mut self, rule: impl LineRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Returns the number of configured rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Validates `text`, returning findings ordered by line.
    ///
    /// Lines are split on `'\n'` only, so a trailing newline yields a final
    /// empty line and carriage returns stay attached to their line.
    #[must_use]
    pub fn validate(&self, text: &str) -> Vec<ValidationError> {
        let mut findings = Vec::new();
        for (index, line) in text.split('\n').enumerate() {
            for rule in &self.rules {
                if let Some(message) = rule.check(line) {
                    trace!(rule = rule.name(), line = index + 1, "validation rule failed");
                    findings.push(ValidationError::new(index + 1, message));
                }
            }
        }
        findings
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::standard()
    }
}

/// Validates `text` with the standard rule set.
#[must_use]
pub fn validate(text: &str) -> Vec<ValidationError> {
    Validator::standard().validate(text)
}
