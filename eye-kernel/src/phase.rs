//! Deployment phase state machine.

use thiserror::Error;
use tracing::debug;

/// Where a session stands with respect to deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployPhase {
    /// No deployment in flight; the deploy action is available.
    #[default]
    Idle,
    /// A deployment request is in flight.
    Deploying,
    /// The backend accepted the configuration. Passed through on the way back
    /// to [`DeployPhase::Idle`], never held.
    Done,
}

impl DeployPhase {
    /// Returns `true` when no deployment is running.
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns `true` while a deployment is in flight.
    #[must_use]
    pub const fn is_deploying(self) -> bool {
        matches!(self, Self::Deploying)
    }
}

/// Events that drive [`PhaseMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// A validated configuration was handed to the deployer.
    Start,
    /// The deployer reported success.
    Finish,
    /// The deployer reported failure.
    Fail,
    /// The operator aborted the in-flight request.
    Cancel,
    /// Success acknowledged; ready for the next deployment.
    Reset,
}

/// Tracks the deploy phase and rejects illegal transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseMachine {
    phase: DeployPhase,
}

impl PhaseMachine {
    /// Creates a machine in [`DeployPhase::Idle`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: DeployPhase::Idle,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> DeployPhase {
        self.phase
    }

    /// Applies an event, returning the resulting phase.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseError::InvalidTransition`] when the event is not allowed
    /// from the current phase.
    pub fn transition(&mut self, event: PhaseEvent) -> PhaseResult<DeployPhase> {
        let next = match (self.phase, event) {
            (DeployPhase::Idle, PhaseEvent::Start) => DeployPhase::Deploying,
            (DeployPhase::Deploying, PhaseEvent::Finish) => DeployPhase::Done,
            (DeployPhase::Deploying, PhaseEvent::Fail | PhaseEvent::Cancel)
            | (DeployPhase::Done, PhaseEvent::Reset) => DeployPhase::Idle,
            (from, event) => return Err(PhaseError::InvalidTransition { from, event }),
        };

        debug!(from = ?self.phase, to = ?next, ?event, "deploy phase transition");
        self.phase = next;
        Ok(next)
    }
}

/// Errors emitted by the phase machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PhaseError {
    /// Event not permitted from the current phase.
    #[error("invalid deploy transition from {from:?} via {event:?}")]
    InvalidTransition {
        /// Phase prior to the attempted transition.
        from: DeployPhase,
        /// Rejected event.
        event: PhaseEvent,
    },
}

/// Result alias for phase transitions.
pub type PhaseResult<T> = Result<T, PhaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_cycle_returns_to_idle() {
        let mut machine = PhaseMachine::new();
        assert!(machine.phase().is_idle());

        machine.transition(PhaseEvent::Start).unwrap();
        assert!(machine.phase().is_deploying());
        assert_eq!(machine.transition(PhaseEvent::Finish).unwrap(), DeployPhase::Done);
        assert_eq!(machine.transition(PhaseEvent::Reset).unwrap(), DeployPhase::Idle);

        // The machine is cyclic.
        machine.transition(PhaseEvent::Start).unwrap();
        assert!(machine.phase().is_deploying());
    }

    #[test]
    fn failure_and_cancel_return_to_idle() {
        for event in [PhaseEvent::Fail, PhaseEvent::Cancel] {
            let mut machine = PhaseMachine::new();
            machine.transition(PhaseEvent::Start).unwrap();
            assert_eq!(machine.transition(event).unwrap(), DeployPhase::Idle);
        }
    }

    #[test]
    fn double_start_is_rejected() {
        let mut machine = PhaseMachine::new();
        machine.transition(PhaseEvent::Start).unwrap();

        let err = machine.transition(PhaseEvent::Start).unwrap_err();
        assert_eq!(
            err,
            PhaseError::InvalidTransition {
                from: DeployPhase::Deploying,
                event: PhaseEvent::Start,
            }
        );
        assert!(machine.phase().is_deploying());
    }

    #[test]
    fn idle_rejects_completion_events() {
        let mut machine = PhaseMachine::new();
        for event in [PhaseEvent::Finish, PhaseEvent::Fail, PhaseEvent::Cancel, PhaseEvent::Reset] {
            assert!(machine.transition(event).is_err(), "{event:?}");
            assert!(machine.phase().is_idle());
        }
    }
}
