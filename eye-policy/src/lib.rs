//! Configuration validation for the Ultron Eye workflow.
//!
//! Validation is a textual heuristic, not a YAML parser: each line is checked
//! on its own by substring rules, and findings come back in line order.

#![warn(missing_docs, clippy::pedantic)]

pub mod finding;
pub mod rules;
pub mod validator;

pub use finding::ValidationError;
pub use rules::{LineRule, NOTIFICATION_LEVEL_MESSAGE, NotificationLevelRule};
pub use validator::{Validator, validate};
