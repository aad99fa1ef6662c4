//! Workflow error taxonomy.

use eye_adapters::{ClipboardError, DeployError};
use eye_policy::ValidationError;
use thiserror::Error;

use crate::phase::PhaseError;
use crate::scheduler::SchedulerError;

/// Errors surfaced by [`ConfigWorkflow`](crate::ConfigWorkflow).
///
/// None of these are fatal; the session stays usable after each.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A template name outside the catalog was requested.
    #[error("unknown template `{name}`")]
    UnknownTemplate {
        /// Requested name.
        name: String,
    },

    /// The configuration has findings, so it cannot be deployed.
    #[error("configuration has {} validation error(s)", errors.len())]
    ValidationFailed {
        /// Findings at the time of the attempt.
        errors: Vec<ValidationError>,
    },

    /// The clipboard refused the copy.
    #[error("copy failed: {source}")]
    ClipboardDenied {
        /// Underlying clipboard failure.
        #[source]
        source: ClipboardError,
    },

    /// The deployer reported a failure; the phase is back to idle.
    #[error("deployment failed: {source}")]
    DeploymentFailed {
        /// Underlying deployer failure.
        #[source]
        source: DeployError,
    },

    /// Deploy phase bookkeeping rejected a transition.
    #[error(transparent)]
    Phase(#[from] PhaseError),

    /// Deploy scheduler could not accept the request.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Result alias for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
