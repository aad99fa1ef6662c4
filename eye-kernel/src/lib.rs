//! Configuration workflow for the Ultron Eye dashboard.
//!
//! A [`ConfigWorkflow`] owns one operator session: the template picker, the
//! editable configuration text and its findings, the deploy phase, the
//! "copied" indicator, and the session history. Deployment runs on a tokio
//! task spawned through [`DeployScheduler`]; the session folds the outcome
//! back in with [`ConfigWorkflow::settle`] or [`ConfigWorkflow::poll_deploy`].

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod history;
mod phase;
mod scheduler;
mod workflow;

pub use error::{WorkflowError, WorkflowResult};
pub use history::{ConfigHistory, HistoryEntry};
pub use phase::{DeployPhase, PhaseError, PhaseEvent, PhaseMachine, PhaseResult};
pub use scheduler::{DeployScheduler, SchedulerConfig, SchedulerError, SchedulerResult};
pub use workflow::{ConfigWorkflow, DeployStatus, Notice, WorkflowBuilder};
