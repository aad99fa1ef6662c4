//! Deployment collaborator contract and the simulated implementation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eye_primitives::DeploymentId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Result alias used by deployers.
pub type DeployResult<T> = Result<T, DeployError>;

/// Failures a deployment backend can report.
///
/// Every variant is recoverable; the workflow returns to idle and the
/// operator may retry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeployError {
    /// Transport failure, timeout, or server-side fault.
    #[error("deployment network error: {reason}")]
    Network {
        /// Additional context for operators.
        reason: String,
    },

    /// Credentials were missing or refused.
    #[error("deployment unauthorized: {reason}")]
    Unauthorized {
        /// Additional context for operators.
        reason: String,
    },

    /// The backend refused the configuration itself.
    #[error("deployment rejected: {reason}")]
    Rejected {
        /// Reason supplied by the backend.
        reason: String,
    },

    /// The request was dropped before reaching the backend.
    #[error("deployment aborted")]
    Aborted,
}

impl DeployError {
    /// Convenience constructor for network failures.
    #[must_use]
    pub fn network(reason: impl Into<String>) -> Self {
        Self::Network {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for rejected configurations.
    #[must_use]
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}

/// Configuration payload handed to a deployer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRequest {
    deployment_id: DeploymentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    template: Option<String>,
    config: String,
}

impl DeployRequest {
    /// Creates a request for the supplied configuration text.
    #[must_use]
    pub fn new(deployment_id: DeploymentId, config: impl Into<String>) -> Self {
        Self {
            deployment_id,
            template: None,
            config: config.into(),
        }
    }

    /// Records the template the text was derived from.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn deployment_id(&self) -> DeploymentId {
        self.deployment_id
    }

    /// Returns the originating template name, if any.
    #[must_use]
    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    /// Returns the configuration text.
    #[must_use]
    pub fn config(&self) -> &str {
        &self.config
    }
}

/// Acknowledgement returned by a successful deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReceipt {
    deployment_id: DeploymentId,
    accepted_at: DateTime<Utc>,
    message: Option<String>,
}

impl DeployReceipt {
    /// Creates a receipt stamped with the current time.
    #[must_use]
    pub fn accepted(deployment_id: DeploymentId) -> Self {
        Self {
            deployment_id,
            accepted_at: Utc::now(),
            message: None,
        }
    }

    /// Attaches a backend message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the identifier of the deployed request.
    #[must_use]
    pub const fn deployment_id(&self) -> DeploymentId {
        self.deployment_id
    }

    /// Returns when the backend accepted the configuration.
    #[must_use]
    pub const fn accepted_at(&self) -> DateTime<Utc> {
        self.accepted_at
    }

    /// Returns the optional backend message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// Pushes configuration text to the fleet.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Deploys the configuration, resolving once the backend has accepted it.
    async fn deploy(&self, request: DeployRequest) -> DeployResult<DeployReceipt>;
}

/// Stand-in deployer that waits a fixed delay and always succeeds.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedDeployer {
    delay: Duration,
}

impl SimulatedDeployer {
    /// Delay used by the operator dashboard.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

    /// Creates a deployer that completes after `delay`.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Returns the configured delay.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for SimulatedDeployer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

#[async_trait]
impl Deployer for SimulatedDeployer {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn deploy(&self, request: DeployRequest) -> DeployResult<DeployReceipt> {
        debug!(
            deployment_id = %request.deployment_id(),
            delay_ms = self.delay.as_millis(),
            "simulating deployment"
        );
        tokio::time::sleep(self.delay).await;
        Ok(DeployReceipt::accepted(request.deployment_id()).with_message("simulated deployment"))
    }
}
