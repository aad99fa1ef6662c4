//! Validation findings reported against configuration text.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single rule violation pinned to a line of the configuration text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    line: usize,
    message: String,
}

impl ValidationError {
    /// Creates a finding for the given 1-based line.
    #[must_use]
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// Returns the 1-based line number.
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_like_the_dashboard() {
        let finding = ValidationError::new(7, "bad value");
        assert_eq!(finding.to_string(), "Line 7: bad value");
    }

    #[test]
    fn serializes_line_and_message() {
        let finding = ValidationError::new(2, "oops");
        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json, serde_json::json!({"line": 2, "message": "oops"}));
    }
}
