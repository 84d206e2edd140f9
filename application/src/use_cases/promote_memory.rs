//! Promote Memory use case.
//!
//! Turns one participant message of an ARCHIVED session into its own
//! episodic memory record, so a single remarkable contribution can resonate
//! in later sessions independently of the session summary.

use crate::gateway::{PersistenceError, PersistenceGateway};
use chrono::Utc;
use council_domain::{EpisodicMemoryRecord, MemoryId, SessionId, SessionState};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during memory promotion.
#[derive(Error, Debug)]
pub enum PromoteMemoryError {
    #[error("Session {session_id} is {state}; only archived sessions can be promoted from")]
    NotArchived {
        session_id: SessionId,
        state: SessionState,
    },

    #[error("Session {session_id} has no message #{sequence}")]
    UnknownMessage { session_id: SessionId, sequence: u64 },

    #[error("Message #{sequence} is itself a memory contribution")]
    MemoryContribution { sequence: u64 },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Input for the [`PromoteMemoryUseCase`].
#[derive(Debug, Clone)]
pub struct PromoteMemoryInput {
    pub session_id: SessionId,
    /// Sequence number of the message to promote.
    pub sequence: u64,
    /// Mark the new record sacred.
    pub sacred: bool,
}

impl PromoteMemoryInput {
    pub fn new(session_id: SessionId, sequence: u64) -> Self {
        Self {
            session_id,
            sequence,
            sacred: false,
        }
    }

    pub fn sacred(mut self) -> Self {
        self.sacred = true;
        self
    }
}

/// Use case for promoting a single message to an episodic memory.
///
/// Idempotent on the derived record id: promoting the same message twice
/// returns the record written the first time (upgraded to sacred if the
/// second call asks for it).
#[derive(Clone)]
pub struct PromoteMemoryUseCase {
    gateway: Arc<PersistenceGateway>,
}

impl PromoteMemoryUseCase {
    pub fn new(gateway: Arc<PersistenceGateway>) -> Self {
        Self { gateway }
    }

    pub async fn execute(
        &self,
        input: PromoteMemoryInput,
    ) -> Result<EpisodicMemoryRecord, PromoteMemoryError> {
        let session = self.gateway.load_session(&input.session_id).await?;
        if session.state() != SessionState::Archived {
            return Err(PromoteMemoryError::NotArchived {
                session_id: input.session_id,
                state: session.state(),
            });
        }

        let message = session
            .messages()
            .iter()
            .find(|m| m.sequence == input.sequence)
            .ok_or_else(|| PromoteMemoryError::UnknownMessage {
                session_id: input.session_id.clone(),
                sequence: input.sequence,
            })?;
        if message.is_memory_contribution() {
            return Err(PromoteMemoryError::MemoryContribution {
                sequence: input.sequence,
            });
        }

        let record = EpisodicMemoryRecord {
            id: MemoryId::for_excerpt(session.id(), message.sequence),
            domain: session.domain().to_string(),
            summary: message.content.clone(),
            indicators: message.indicators.clone(),
            sacred: input.sacred,
            created_at: Utc::now(),
            source_session_id: session.id().clone(),
            source_sequence: Some(message.sequence),
        };

        let saved = self.gateway.save_memory(&record).await;
        match saved {
            Ok(()) => {
                info!(
                    "Promoted message #{} of session {} to memory {}",
                    input.sequence, input.session_id, record.id
                );
                Ok(record)
            }
            Err(PersistenceError::Duplicate(_)) if input.sacred => {
                debug!("Memory {} exists, promoting to sacred", record.id);
                Ok(self.gateway.promote_sacred(&record.id).await?)
            }
            Err(PersistenceError::Duplicate(_)) => {
                debug!("Memory {} already promoted", record.id);
                Ok(self.gateway.get_memory(&record.id).await?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockStore;
    use council_domain::{
        ConclusionCause, IndicatorVector, MessageDraft, MessageKind, Participant, Session,
    };

    async fn archived_session(gateway: &PersistenceGateway) -> Session {
        let now = Utc::now();
        let mut session = Session::new(SessionId::new("ses-1"), "ethics", "care", now);
        let participant = Participant::new("p0", "v1");
        let id = participant.id.clone();
        session.enroll(participant).unwrap();
        session.activate().unwrap();
        let round = session.begin_round(now).unwrap();

        let mut indicators = IndicatorVector::new();
        indicators.add("reverence-signal", 2);
        session
            .append_message(
                round,
                MessageDraft::participant(id, MessageKind::Proposal, "Care is sacred.", indicators),
                now,
            )
            .unwrap();
        session
            .append_message(
                round,
                MessageDraft::memory(MemoryId::new("mem-old"), "echo", IndicatorVector::new()),
                now,
            )
            .unwrap();
        session.complete_round(0.5, now).unwrap();
        session.begin_concluding(ConclusionCause::MaxRounds).unwrap();
        session.archive(now).unwrap();

        let version = gateway.save_session(&session).await.unwrap();
        session.set_version(version);
        session
    }

    fn setup() -> (PromoteMemoryUseCase, Arc<PersistenceGateway>) {
        let gateway = Arc::new(PersistenceGateway::new(Box::new(MockStore::new())));
        (PromoteMemoryUseCase::new(Arc::clone(&gateway)), gateway)
    }

    #[tokio::test]
    async fn test_promote_message() {
        let (use_case, gateway) = setup();
        archived_session(&gateway).await;

        let record = use_case
            .execute(PromoteMemoryInput::new(SessionId::new("ses-1"), 1))
            .await
            .unwrap();

        assert_eq!(record.id.as_str(), "mem-ses-1-1");
        assert_eq!(record.summary, "Care is sacred.");
        assert_eq!(record.indicators.count("reverence-signal"), 2);
        assert_eq!(record.source_sequence, Some(1));
        assert!(record.is_excerpt());
        assert!(!record.sacred);
        assert_eq!(gateway.get_memory(&record.id).await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_promote_twice_is_idempotent() {
        let (use_case, gateway) = setup();
        archived_session(&gateway).await;
        let input = PromoteMemoryInput::new(SessionId::new("ses-1"), 1);

        let first = use_case.execute(input.clone()).await.unwrap();
        let second = use_case.execute(input.clone()).await.unwrap();
        assert_eq!(first, second);

        // Asking again with the sacred flag upgrades the same record
        let sacred = use_case.execute(input.sacred()).await.unwrap();
        assert_eq!(sacred.id, first.id);
        assert!(sacred.sacred);
        assert_eq!(sacred.created_at, first.created_at);
    }

    #[tokio::test]
    async fn test_rejects_memory_contribution() {
        let (use_case, gateway) = setup();
        archived_session(&gateway).await;

        let err = use_case
            .execute(PromoteMemoryInput::new(SessionId::new("ses-1"), 2))
            .await
            .unwrap_err();
        assert!(matches!(err, PromoteMemoryError::MemoryContribution { sequence: 2 }));
    }

    #[tokio::test]
    async fn test_rejects_unknown_message() {
        let (use_case, gateway) = setup();
        archived_session(&gateway).await;

        let err = use_case
            .execute(PromoteMemoryInput::new(SessionId::new("ses-1"), 9))
            .await
            .unwrap_err();
        assert!(matches!(err, PromoteMemoryError::UnknownMessage { sequence: 9, .. }));
    }

    #[tokio::test]
    async fn test_rejects_session_that_is_not_archived() {
        let (use_case, gateway) = setup();
        let mut session = Session::new(SessionId::new("ses-2"), "ethics", "t", Utc::now());
        session.fail(council_domain::ReasonCode::Cancelled, Utc::now()).unwrap();
        gateway.save_session(&session).await.unwrap();

        let err = use_case
            .execute(PromoteMemoryInput::new(SessionId::new("ses-2"), 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PromoteMemoryError::NotArchived {
                state: SessionState::Failed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (use_case, _) = setup();
        let err = use_case
            .execute(PromoteMemoryInput::new(SessionId::new("nope"), 1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PromoteMemoryError::Persistence(PersistenceError::NotFound(_))
        ));
    }
}
