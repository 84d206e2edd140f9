//! Session lifecycle states.
//!
//! ```text
//! FORMING ──> ACTIVE ──> CONCLUDING ──> ARCHIVED
//!    │          │
//!    └────┬─────┘
//!         v
//!      FAILED (absorbing)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Forming,
    Active,
    Concluding,
    Archived,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Forming => "FORMING",
            SessionState::Active => "ACTIVE",
            SessionState::Concluding => "CONCLUDING",
            SessionState::Archived => "ARCHIVED",
            SessionState::Failed => "FAILED",
        }
    }

    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Forming, Active)
                | (Forming, Failed)
                | (Active, Concluding)
                | (Active, Failed)
                | (Concluding, Archived)
        )
    }

    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Archived | SessionState::Failed)
    }

    /// External cancellation is honored in these states only
    pub fn is_cancellable(&self) -> bool {
        matches!(self, SessionState::Forming | SessionState::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a session left the ACTIVE state successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConclusionCause {
    /// The configured maximum round count was reached
    MaxRounds,
    /// The convergence condition held
    Converged,
}

impl fmt::Display for ConclusionCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConclusionCause::MaxRounds => write!(f, "max-rounds"),
            ConclusionCause::Converged => write!(f, "converged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use SessionState::*;
        assert!(Forming.can_transition_to(Active));
        assert!(Forming.can_transition_to(Failed));
        assert!(Active.can_transition_to(Concluding));
        assert!(Active.can_transition_to(Failed));
        assert!(Concluding.can_transition_to(Archived));
    }

    #[test]
    fn test_forbidden_transitions() {
        use SessionState::*;
        assert!(!Concluding.can_transition_to(Failed));
        assert!(!Archived.can_transition_to(Active));
        assert!(!Failed.can_transition_to(Active));
        assert!(!Forming.can_transition_to(Concluding));
        assert!(!Active.can_transition_to(Archived));
    }

    #[test]
    fn test_terminal_and_cancellable() {
        assert!(SessionState::Archived.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::Concluding.is_terminal());

        assert!(SessionState::Forming.is_cancellable());
        assert!(SessionState::Active.is_cancellable());
        assert!(!SessionState::Concluding.is_cancellable());
    }

    #[test]
    fn test_display() {
        assert_eq!(SessionState::Concluding.to_string(), "CONCLUDING");
        assert_eq!(ConclusionCause::Converged.to_string(), "converged");
    }
}
