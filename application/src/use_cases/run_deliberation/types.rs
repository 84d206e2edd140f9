//! Input, output and error types for the deliberation use case.

use crate::gateway::PersistenceError;
use crate::ports::participant_adapter::ParticipantCandidate;
use council_domain::{
    DomainError, EpisodicMemoryRecord, MetricsRecord, ReasonCode, Session, SessionId,
    SessionState,
};
use thiserror::Error;

/// Input for a deliberation run
#[derive(Debug, Clone)]
pub struct RunDeliberationInput {
    /// Generated when not provided
    pub session_id: Option<SessionId>,
    pub domain: String,
    pub topic: String,
    /// Candidate pool, in registry order
    pub candidates: Vec<ParticipantCandidate>,
}

impl RunDeliberationInput {
    pub fn new(
        domain: impl Into<String>,
        topic: impl Into<String>,
        candidates: Vec<ParticipantCandidate>,
    ) -> Self {
        Self {
            session_id: None,
            domain: domain.into(),
            topic: topic.into(),
            candidates,
        }
    }

    pub fn with_session_id(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }
}

/// Everything committed by a successful conclusion
#[derive(Debug, Clone)]
pub struct DeliberationOutcome {
    pub session: Session,
    pub metrics: MetricsRecord,
    pub memory: EpisodicMemoryRecord,
}

/// Errors that end a deliberation run
///
/// Fatal errors carry the session so the caller can see how far it got and,
/// after a persistence failure, retry the conclusion.
#[derive(Error, Debug)]
pub enum DeliberationError {
    #[error("Session {} failed: {reason}", .session.id())]
    SessionFailed {
        session: Box<Session>,
        reason: ReasonCode,
    },

    #[error("Session {} could not be persisted: {source}", .session.id())]
    PersistenceFailure {
        session: Box<Session>,
        #[source]
        source: PersistenceError,
    },

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DeliberationError {
    pub fn session(&self) -> Option<&Session> {
        match self {
            DeliberationError::SessionFailed { session, .. }
            | DeliberationError::PersistenceFailure { session, .. } => Some(session),
            _ => None,
        }
    }

    /// Take the session back, e.g. to retry its conclusion
    pub fn into_session(self) -> Option<Session> {
        match self {
            DeliberationError::SessionFailed { session, .. }
            | DeliberationError::PersistenceFailure { session, .. } => Some(*session),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session().map(|s| s.id())
    }

    /// Final state of the session
    pub fn state(&self) -> Option<SessionState> {
        self.session().map(|s| s.state())
    }

    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            DeliberationError::SessionFailed { reason, .. } => Some(*reason),
            // Retries are exhausted by the time this surfaces, conflicts included
            DeliberationError::PersistenceFailure { .. } => Some(ReasonCode::PersistenceFailure),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason_code() == Some(ReasonCode::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::durable_store::StoreError;
    use chrono::Utc;

    #[test]
    fn test_error_report_fields() {
        let mut session = Session::new(SessionId::new("ses-1"), "ethics", "t", Utc::now());
        session.fail(ReasonCode::InsufficientQuorum, Utc::now()).unwrap();
        let error = DeliberationError::SessionFailed {
            session: Box::new(session),
            reason: ReasonCode::InsufficientQuorum,
        };

        assert_eq!(error.session_id().map(|id| id.as_str()), Some("ses-1"));
        assert_eq!(error.state(), Some(SessionState::Failed));
        assert_eq!(error.reason_code(), Some(ReasonCode::InsufficientQuorum));
        assert_eq!(error.to_string(), "Session ses-1 failed: INSUFFICIENT_QUORUM");
    }

    #[test]
    fn test_persistence_failure_keeps_session() {
        let session = Session::new(SessionId::new("ses-2"), "ethics", "t", Utc::now());
        let error = DeliberationError::PersistenceFailure {
            session: Box::new(session),
            source: PersistenceError::Store(StoreError::Unavailable("down".into())),
        };
        assert_eq!(error.reason_code(), Some(ReasonCode::PersistenceFailure));
        assert_eq!(error.state(), Some(SessionState::Forming));
        assert!(error.into_session().is_some());
    }

    #[test]
    fn test_exhausted_conflict_reports_persistence_failure() {
        let session = Session::new(SessionId::new("ses-3"), "ethics", "t", Utc::now());
        let error = DeliberationError::PersistenceFailure {
            session: Box::new(session),
            source: PersistenceError::Conflict {
                key: "ses-3".into(),
                expected: 0,
                actual: 4,
            },
        };
        assert_eq!(error.reason_code(), Some(ReasonCode::PersistenceFailure));
        assert!(matches!(
            std::error::Error::source(&error)
                .and_then(|e| e.downcast_ref::<PersistenceError>()),
            Some(PersistenceError::Conflict { .. })
        ));
    }
}
