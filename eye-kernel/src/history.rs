//! Session log of accepted deployments.

use chrono::{DateTime, Utc};
use eye_primitives::DeploymentId;
use serde::Serialize;

/// One accepted deployment as shown in the configuration history panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    deployment_id: DeploymentId,
    recorded_at: DateTime<Utc>,
    operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    description: String,
}

impl HistoryEntry {
    /// Creates an entry describing a deployment.
    #[must_use]
    pub fn new(
        deployment_id: DeploymentId,
        recorded_at: DateTime<Utc>,
        operator: impl Into<String>,
        template: Option<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            deployment_id,
            recorded_at,
            operator: operator.into(),
            template,
            description: description.into(),
        }
    }

    /// Identifier of the deployment.
    #[must_use]
    pub const fn deployment_id(&self) -> DeploymentId {
        self.deployment_id
    }

    /// When the backend accepted the configuration.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Operator who triggered the deployment.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Template active at deploy time.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Summary line.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// In-memory history, bounded to the most recent entries.
#[derive(Debug, Clone)]
pub struct ConfigHistory {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl ConfigHistory {
    /// Default number of entries retained.
    pub const DEFAULT_LIMIT: usize = 50;

    /// Creates an empty history keeping at most `limit` entries.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Appends an entry, evicting the oldest when full.
    pub fn record(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.limit {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    /// Iterates entries newest first.
    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    /// Returns the most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Number of retained entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been deployed this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConfigHistory {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}
