//! Domain error types

use crate::session::state::SessionState;
use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },

    #[error("Participant {0} is already enrolled in this session")]
    AlreadyEnrolled(String),

    #[error("Participant {0} is not enrolled in this session")]
    UnknownParticipant(String),

    #[error("Session {0} is archived and can no longer change")]
    SessionArchived(String),

    #[error("Round {round} is not the current round (current: {current})")]
    RoundMismatch { round: u32, current: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DomainError {
    /// Check if this error was raised by a state machine violation
    pub fn is_transition_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidTransition { .. } | DomainError::SessionArchived(_)
        )
    }
}
