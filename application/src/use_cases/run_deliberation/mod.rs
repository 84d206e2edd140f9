//! Run Deliberation use case
//!
//! Drives one session through its lifecycle:
//!
//! ```text
//! FORMING     rank candidates by health, enroll up to the target size
//!    │        quorum not met → FAILED(INSUFFICIENT_QUORUM)
//!    v
//! ACTIVE      loop { fan out → fan in → commit → score → resonate }
//!    │        quorum lost    → FAILED(QUORUM_LOST)
//!    │        cancelled      → FAILED(CANCELLED)
//!    v
//! CONCLUDING  commit metrics → memory → session (bounded retries)
//!    v
//! ARCHIVED
//! ```
//!
//! Session state is only ever mutated by this task; participant calls run
//! concurrently but their results are committed in enrollment order once
//! every call has finished.

mod conclude;
mod round;
mod types;

pub use types::{DeliberationError, DeliberationOutcome, RunDeliberationInput};

use crate::config::DeliberationConfig;
use crate::gateway::PersistenceGateway;
use crate::health::HealthTracker;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::participant_adapter::{ParticipantAdapter, ParticipantCandidate};
use crate::ports::progress::{DeliberationProgress, NoProgress};
use crate::resonance::MemoryResonanceEngine;
use chrono::Utc;
use council_domain::config::has_errors;
use council_domain::{DomainError, ParticipantId, ReasonCode, Session, SessionId, SessionState};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type AdapterMap = HashMap<ParticipantId, Arc<dyn ParticipantAdapter>>;

/// Why the ACTIVE loop stopped early
enum Halt {
    Fail(ReasonCode),
    Domain(DomainError),
}

impl From<DomainError> for Halt {
    fn from(error: DomainError) -> Self {
        Halt::Domain(error)
    }
}

/// Use case for running a deliberation session
#[derive(Clone)]
pub struct DeliberationOrchestrator {
    gateway: Arc<PersistenceGateway>,
    health: Arc<HealthTracker>,
    resonance: Arc<MemoryResonanceEngine>,
    config: DeliberationConfig,
    logger: Arc<dyn ConversationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl DeliberationOrchestrator {
    pub fn new(
        gateway: Arc<PersistenceGateway>,
        health: Arc<HealthTracker>,
        config: DeliberationConfig,
    ) -> Self {
        let resonance = Arc::new(MemoryResonanceEngine::new(
            Arc::clone(&gateway),
            config.resonance.clone(),
        ));
        Self {
            gateway,
            health,
            resonance,
            config,
            logger: Arc::new(NoConversationLogger),
            cancellation_token: None,
        }
    }

    /// Set a transcript logger
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Set a cancellation token for cooperative interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn config(&self) -> &DeliberationConfig {
        &self.config
    }

    pub fn resonance(&self) -> &MemoryResonanceEngine {
        &self.resonance
    }

    /// Run a deliberation without progress reporting
    pub async fn execute(
        &self,
        input: RunDeliberationInput,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Run a deliberation with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: RunDeliberationInput,
        progress: &dyn DeliberationProgress,
    ) -> Result<DeliberationOutcome, DeliberationError> {
        let issues = self.config.validate();
        if has_errors(&issues) {
            let messages: Vec<String> = issues
                .iter()
                .filter(|i| i.is_error())
                .map(|i| i.message.clone())
                .collect();
            return Err(DeliberationError::InvalidConfig(messages.join("; ")));
        }

        let session_id = input.session_id.clone().unwrap_or_else(SessionId::generate);
        let mut session = Session::new(session_id, &input.domain, &input.topic, Utc::now());
        info!(
            "Forming session {} in domain '{}' from {} candidates",
            session.id(),
            session.domain(),
            input.candidates.len()
        );

        // Phase 1: Formation
        let adapters = self.form(&mut session, input.candidates)?;

        if self.is_cancelled() {
            return Err(self.fail(session, ReasonCode::Cancelled, progress).await);
        }
        let required = self.config.required_quorum();
        if session.active_count() < required {
            warn!(
                "Session {}: {} participants enrolled, {} required",
                session.id(),
                session.active_count(),
                required
            );
            return Err(self.fail(session, ReasonCode::InsufficientQuorum, progress).await);
        }
        session.activate()?;

        let enrolled: Vec<ParticipantId> =
            session.active_participants().map(|p| p.id.clone()).collect();
        info!(
            "Session {} active with {} participants",
            session.id(),
            enrolled.len()
        );
        progress.on_session_formed(session.id(), &enrolled);
        self.logger.log(ConversationEvent::new(
            "session_formed",
            json!({
                "session_id": session.id(),
                "domain": session.domain(),
                "topic": session.topic(),
                "participants": enrolled,
            }),
        ));

        // Phase 2: Rounds
        match self.run_rounds(&mut session, &adapters, progress).await {
            Ok(cause) => session.begin_concluding(cause)?,
            Err(Halt::Fail(reason)) => {
                return Err(self.fail(session, reason, progress).await);
            }
            Err(Halt::Domain(error)) => return Err(error.into()),
        }

        // Phase 3: Conclusion
        let result = self.conclude(session).await;
        if let Ok(outcome) = &result {
            progress.on_session_finished(outcome.session.id(), outcome.session.state());
        }
        result
    }

    /// Enroll the healthiest candidates up to the target size
    fn form(
        &self,
        session: &mut Session,
        candidates: Vec<ParticipantCandidate>,
    ) -> Result<AdapterMap, DomainError> {
        let ranked = self.health.rank(candidates, |c| &c.participant.id);
        let mut adapters = AdapterMap::new();

        for candidate in ranked {
            if adapters.len() >= self.config.target_participants {
                break;
            }
            let id = candidate.participant.id.clone();
            if adapters.contains_key(&id) {
                debug!("Skipping duplicate candidate {}", id);
                continue;
            }
            debug!(
                "Enrolling {} (health {:.2})",
                id,
                self.health.success_ratio(&id)
            );
            session.enroll(candidate.participant)?;
            adapters.insert(id, candidate.adapter);
        }
        Ok(adapters)
    }

    /// Move the session to FAILED, persist it best-effort and build the error
    async fn fail(
        &self,
        mut session: Session,
        reason: ReasonCode,
        progress: &dyn DeliberationProgress,
    ) -> DeliberationError {
        if let Err(e) = session.fail(reason, Utc::now()) {
            return e.into();
        }
        warn!("Session {} failed: {}", session.id(), reason);

        match self.gateway.save_session(&session).await {
            Ok(version) => session.set_version(version),
            Err(e) => warn!("Could not persist failed session {}: {}", session.id(), e),
        }

        self.resonance.forget_session(session.id());
        progress.on_session_finished(session.id(), SessionState::Failed);
        self.logger.log(ConversationEvent::new(
            "session_failed",
            json!({
                "session_id": session.id(),
                "reason": reason,
                "rounds_completed": session.completed_rounds(),
                "message_count": session.messages().len(),
            }),
        ));

        DeliberationError::SessionFailed {
            session: Box::new(session),
            reason,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
