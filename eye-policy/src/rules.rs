//! Individual line rules.

use std::fmt;

/// Message reported for a `notification_level` line without an accepted value.
pub const NOTIFICATION_LEVEL_MESSAGE: &str =
    r#"notification_level must be one of: "warning", "error", "block""#;

/// A check applied to each line of the configuration independently.
///
/// Rules see raw text only. They have no notion of comments, quoting, or
/// document structure.
pub trait LineRule: fmt::Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Returns a message when the line violates the rule.
    fn check(&self, line: &str) -> Option<String>;
}

/// Requires any line mentioning `notification_level` to carry one of the
/// quoted values `"warning"`, `"error"`, or `"block"`.
///
/// Matching is plain substring search, so a commented-out key is still
/// flagged and an accepted value anywhere on the line satisfies the rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationLevelRule;

impl NotificationLevelRule {
    const KEY: &'static str = "notification_level";
    const ACCEPTED: [&'static str; 3] = [r#""warning""#, r#""error""#, r#""block""#];
}

impl LineRule for NotificationLevelRule {
    fn name(&self) -> &str {
        Self::KEY
    }

    fn check(&self, line: &str) -> Option<String> {
        if !line.contains(Self::KEY) {
            return None;
        }

        if Self::ACCEPTED.iter().any(|value| line.contains(value)) {
            return None;
        }

        Some(NOTIFICATION_LEVEL_MESSAGE.to_owned())
    }
}
