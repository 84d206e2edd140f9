//! The CONCLUDING phase: build records, commit them, archive.
//!
//! Commit order is metrics → memory → session. Every step is idempotent
//! per session id, so a conclusion that failed part way through can simply
//! be called again with the same session.

use super::{DeliberationError, DeliberationOrchestrator, DeliberationOutcome};
use crate::gateway::PersistenceError;
use crate::ports::conversation_logger::ConversationEvent;
use chrono::{DateTime, Utc};
use council_domain::{
    ConclusionCause, DomainError, EmergenceAggregator, EpisodicMemoryRecord, IndicatorVector,
    MemoryId, MetricsRecord, Session, SessionState,
};
use serde_json::json;
use std::future::Future;
use tracing::{debug, info, warn};

impl DeliberationOrchestrator {
    /// Commit a CONCLUDING session and archive it.
    ///
    /// On `PersistenceFailure` the error carries the session unchanged;
    /// passing it back here retries the conclusion. An already archived
    /// session returns its stored records.
    pub async fn conclude(&self, session: Session) -> Result<DeliberationOutcome, DeliberationError> {
        match session.state() {
            SessionState::Concluding => {}
            SessionState::Archived => return self.stored_outcome(session).await,
            state => {
                return Err(DomainError::InvalidTransition {
                    from: state,
                    to: SessionState::Archived,
                }
                .into());
            }
        }

        let now = Utc::now();
        let metrics = match self.commit_metrics(self.build_metrics(&session, now)).await {
            Ok(metrics) => metrics,
            Err(source) => return Err(persistence_failure(session, source)),
        };
        let memory = match self.commit_memory(self.build_memory(&session, now)).await {
            Ok(memory) => memory,
            Err(source) => return Err(persistence_failure(session, source)),
        };
        let session = self.commit_session(session, now).await?;

        info!(
            "Session {} archived: score {:.3}, {} sacred moments, memory {}",
            session.id(),
            metrics.final_emergence_score,
            metrics.sacred_moments.len(),
            memory.id
        );
        self.resonance.forget_session(session.id());
        self.logger.log(ConversationEvent::new(
            "session_archived",
            json!({
                "session_id": session.id(),
                "conclusion": metrics.conclusion,
                "final_emergence_score": metrics.final_emergence_score,
                "rounds_completed": metrics.rounds_completed,
                "message_count": metrics.message_count,
                "memory_id": memory.id,
                "sacred": memory.sacred,
            }),
        ));

        Ok(DeliberationOutcome {
            session,
            metrics,
            memory,
        })
    }

    // ==================== Record Synthesis ====================

    fn build_metrics(&self, session: &Session, now: DateTime<Utc>) -> MetricsRecord {
        let aggregator = EmergenceAggregator::new(&self.config.emergence);
        MetricsRecord {
            session_id: session.id().clone(),
            domain: session.domain().to_string(),
            final_emergence_score: session.emergence_score(),
            indicator_frequency: aggregator.frequency_table(session.messages()),
            sacred_moments: session.sacred_moments().to_vec(),
            health_snapshot: session
                .participants()
                .iter()
                .map(|e| self.health.snapshot(&e.participant.id))
                .collect(),
            rounds_completed: session.completed_rounds(),
            message_count: session.messages().len(),
            conclusion: session.conclusion().unwrap_or(ConclusionCause::MaxRounds),
            concluded_at: now,
        }
    }

    fn build_memory(&self, session: &Session, now: DateTime<Utc>) -> EpisodicMemoryRecord {
        let mut indicators = IndicatorVector::new();
        let mut closing = None;
        for message in session.messages().iter().filter(|m| !m.is_memory_contribution()) {
            indicators.merge(&message.indicators);
            closing = Some(message.content.as_str());
        }

        let summary = match closing {
            Some(content) => format!("On \"{}\": {}", session.topic(), content),
            None => format!("On \"{}\"", session.topic()),
        };

        EpisodicMemoryRecord {
            id: MemoryId::for_session(session.id()),
            domain: session.domain().to_string(),
            summary,
            indicators,
            sacred: !session.sacred_moments().is_empty(),
            created_at: now,
            source_session_id: session.id().clone(),
            source_sequence: None,
        }
    }

    // ==================== Commits ====================

    async fn commit_metrics(&self, record: MetricsRecord) -> Result<MetricsRecord, PersistenceError> {
        let saved = self
            .with_retry("save metrics", || self.gateway.save_metrics(&record))
            .await;
        match saved {
            Ok(()) => Ok(record),
            Err(PersistenceError::Duplicate(_)) => {
                debug!("Metrics for {} already committed", record.session_id);
                self.with_retry("load metrics", || self.gateway.load_metrics(&record.session_id))
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn commit_memory(
        &self,
        record: EpisodicMemoryRecord,
    ) -> Result<EpisodicMemoryRecord, PersistenceError> {
        let saved = self
            .with_retry("save memory", || self.gateway.save_memory(&record))
            .await;
        match saved {
            Ok(()) => Ok(record),
            Err(PersistenceError::Duplicate(key)) => {
                let stored = self
                    .with_retry("load memory", || self.gateway.get_memory(&record.id))
                    .await?;
                if stored.source_session_id != record.source_session_id {
                    return Err(PersistenceError::Duplicate(key));
                }
                debug!("Memory {} already committed", record.id);
                Ok(stored)
            }
            Err(e) => Err(e),
        }
    }

    /// Archive and write the session, reloading on version conflicts.
    ///
    /// A newer stored version is adopted only while it is the same
    /// deliberation still CONCLUDING; any other stored copy is left intact.
    async fn commit_session(
        &self,
        mut session: Session,
        now: DateTime<Utc>,
    ) -> Result<Session, DeliberationError> {
        let policy = self.config.retry;
        let mut archived = session.clone();
        archived.archive(now)?;

        let mut attempt = 1;
        loop {
            let saved = self.gateway.save_session(&archived).await;
            let error = match saved {
                Ok(version) => {
                    archived.set_version(version);
                    return Ok(archived);
                }
                Err(conflict @ PersistenceError::Conflict { .. }) => {
                    let reloaded = self.gateway.load_session(session.id()).await;
                    match reloaded {
                        Ok(stored) if !stored.same_lineage(&session) => {
                            warn!(
                                "Session {} was stored by another deliberation ({}), not overwriting",
                                stored.id(),
                                stored.state()
                            );
                            return Err(persistence_failure(session, conflict));
                        }
                        Ok(stored) if stored.state() == SessionState::Archived => {
                            info!("Session {} was already archived", stored.id());
                            return Ok(stored);
                        }
                        Ok(stored) if stored.state() != SessionState::Concluding => {
                            warn!(
                                "Session {} is stored as {}, not overwriting",
                                stored.id(),
                                stored.state()
                            );
                            return Err(persistence_failure(session, conflict));
                        }
                        Ok(stored) => {
                            debug!(
                                "Session {} advanced to version {}, retrying",
                                stored.id(),
                                stored.version()
                            );
                            archived.set_version(stored.version());
                            session.set_version(stored.version());
                            conflict
                        }
                        Err(e) => e,
                    }
                }
                Err(e) => e,
            };

            let retryable = matches!(error, PersistenceError::Conflict { .. }) || error.is_transient();
            if !retryable || !policy.has_attempts_left(attempt) {
                warn!(
                    "Giving up on session {} after {} attempts: {}",
                    session.id(),
                    attempt,
                    error
                );
                return Err(persistence_failure(session, error));
            }

            let delay = policy.delay_after(attempt);
            warn!(
                "Saving session {} failed (attempt {}/{}): {}; retrying in {:?}",
                session.id(),
                attempt,
                policy.max_attempts,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts
    async fn with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, PersistenceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PersistenceError>>,
    {
        let policy = self.config.retry;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && policy.has_attempts_left(attempt) => {
                    let delay = policy.delay_after(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what, attempt, policy.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn stored_outcome(&self, session: Session) -> Result<DeliberationOutcome, DeliberationError> {
        let memory_id = MemoryId::for_session(session.id());
        let records = async {
            let metrics = self.gateway.load_metrics(session.id()).await?;
            let memory = self.gateway.get_memory(&memory_id).await?;
            Ok::<_, PersistenceError>((metrics, memory))
        }
        .await;

        match records {
            Ok((metrics, memory)) => Ok(DeliberationOutcome {
                session,
                metrics,
                memory,
            }),
            Err(source) => Err(persistence_failure(session, source)),
        }
    }
}

fn persistence_failure(session: Session, source: PersistenceError) -> DeliberationError {
    DeliberationError::PersistenceFailure {
        session: Box::new(session),
        source,
    }
}
