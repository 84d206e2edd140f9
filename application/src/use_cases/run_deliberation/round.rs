//! The ACTIVE phase: round fan-out, commit, scoring and resonance.

use super::{AdapterMap, DeliberationOrchestrator, Halt};
use crate::ports::conversation_logger::ConversationEvent;
use crate::ports::participant_adapter::PromptContext;
use crate::ports::progress::DeliberationProgress;
use crate::resonance::DialogueSnapshot;
use chrono::Utc;
use council_domain::{
    ConclusionCause, EmergenceAggregator, IndicatorExtractor, IndicatorVector, MessageDraft,
    MessageKind, ParticipantId, ParticipantResponse, PromptTemplate, ReasonCode,
    ResponseClassification, RoundOutcome, SacredMoment, Session,
};
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A participant's reply and whether it came from a timeout
type Reply = (ParticipantResponse, bool);

impl DeliberationOrchestrator {
    /// Run rounds until the session should conclude
    pub(super) async fn run_rounds(
        &self,
        session: &mut Session,
        adapters: &AdapterMap,
        progress: &dyn DeliberationProgress,
    ) -> Result<ConclusionCause, Halt> {
        loop {
            if self.is_cancelled() {
                return Err(Halt::Fail(ReasonCode::Cancelled));
            }
            self.run_round(session, adapters, progress).await?;
            if let Some(cause) = self.conclusion_for(session) {
                info!(
                    "Session {} concluding after {} rounds ({:?})",
                    session.id(),
                    session.completed_rounds(),
                    cause
                );
                return Ok(cause);
            }
        }
    }

    async fn run_round(
        &self,
        session: &mut Session,
        adapters: &AdapterMap,
        progress: &dyn DeliberationProgress,
    ) -> Result<u32, Halt> {
        let round = session.begin_round(Utc::now())?;
        let roster: Vec<ParticipantId> =
            session.active_participants().map(|p| p.id.clone()).collect();
        info!(
            "Session {}: round {} with {} participants",
            session.id(),
            round,
            roster.len()
        );
        progress.on_round_start(round, roster.len());

        let kind = MessageKind::for_round(round, self.config.max_rounds);
        let transcript = recent_transcript(session, self.config.transcript_context);
        let prompt = match kind {
            MessageKind::Proposal => PromptTemplate::opening(session.topic()),
            MessageKind::Reflection => PromptTemplate::reflection(session.topic(), &transcript),
            _ => PromptTemplate::continuation(session.topic(), round, &transcript),
        };
        let context = PromptContext {
            session_id: session.id().clone(),
            round,
            domain: session.domain().to_string(),
            kind,
            system_prompt: PromptTemplate::participant_system().to_string(),
            transcript,
        };

        let Some(mut replies) = self.fan_out(&roster, adapters, &prompt, &context).await else {
            return Err(Halt::Fail(ReasonCode::Cancelled));
        };

        // Commit in enrollment order so sequence numbers are deterministic
        let extractor = IndicatorExtractor::new(&self.config.emergence.vocabulary);
        for id in &roster {
            let (response, timed_out) = replies
                .remove(id)
                .unwrap_or_else(|| (ParticipantResponse::transient("participant task aborted"), false));
            let classification = response.classification;
            let now = Utc::now();
            self.health.record(id, classification, now);
            progress.on_participant_outcome(round, id, classification);

            let message_sequence = match classification {
                ResponseClassification::Success => {
                    let indicators = extractor.extract(&response.content, &response.indicator_hints);
                    let draft = MessageDraft::participant(id.clone(), kind, response.content, indicators);
                    let sequence = session.append_message(round, draft, now)?;
                    debug!("{} responded (#{})", id, sequence);
                    Some(sequence)
                }
                ResponseClassification::Filtered => {
                    debug!("{} response was filtered by its provider", id);
                    None
                }
                ResponseClassification::TransientFailure => {
                    warn!(
                        "{} excluded from round {}: {}",
                        id,
                        round,
                        response.error.as_deref().unwrap_or("transient failure")
                    );
                    None
                }
                ResponseClassification::TerminalFailure => {
                    warn!(
                        "{} degraded for the rest of session {}: {}",
                        id,
                        session.id(),
                        response.error.as_deref().unwrap_or("terminal failure")
                    );
                    session.mark_degraded(id, round)?;
                    None
                }
            };

            session.record_outcome(
                round,
                RoundOutcome {
                    participant_id: id.clone(),
                    classification,
                    timed_out,
                    message_sequence,
                },
            )?;
        }

        let required = self.config.required_quorum();
        if session.active_count() < required {
            warn!(
                "Session {} lost quorum in round {}: {} active, {} required",
                session.id(),
                round,
                session.active_count(),
                required
            );
            return Err(Halt::Fail(ReasonCode::QuorumLost));
        }

        // Score
        let now = Utc::now();
        let aggregator = EmergenceAggregator::new(&self.config.emergence);
        let score = aggregator.score(session.messages());
        session.complete_round(score, now)?;
        let sacred = aggregator.is_sacred(score);
        if sacred {
            info!(
                "Session {}: sacred moment in round {} (score {:.3})",
                session.id(),
                round,
                score
            );
            session.add_sacred_moment(SacredMoment {
                round,
                score,
                after_sequence: session.last_sequence(),
                at: now,
            })?;
        }
        progress.on_round_complete(round, score, sacred);

        let current = session.current_round();
        self.logger.log(ConversationEvent::new(
            "round_completed",
            json!({
                "session_id": session.id(),
                "round": round,
                "kind": kind,
                "emergence_score": score,
                "sacred": sacred,
                "responses": current.map(|r| r.count(ResponseClassification::Success)),
                "filtered": current.map(|r| r.count(ResponseClassification::Filtered)),
                "failures": current.map(|r| {
                    r.count(ResponseClassification::TransientFailure)
                        + r.count(ResponseClassification::TerminalFailure)
                }),
                "messages": session
                    .round_messages(round)
                    .map(|m| json!({"sequence": m.sequence, "author": m.author.to_string(), "content": m.content}))
                    .collect::<Vec<_>>(),
            }),
        ));

        // Resonance happens strictly between rounds
        self.resonate(session, round, progress).await?;
        Ok(round)
    }

    /// Ask every roster participant concurrently and wait for all of them.
    ///
    /// Returns `None` if cancelled; calls still in flight are left to finish
    /// on their own and their results are dropped.
    async fn fan_out(
        &self,
        roster: &[ParticipantId],
        adapters: &AdapterMap,
        prompt: &str,
        context: &PromptContext,
    ) -> Option<HashMap<ParticipantId, Reply>> {
        let timeout = self.config.participant_timeout;
        let mut join_set = JoinSet::new();

        for id in roster {
            let Some(adapter) = adapters.get(id) else {
                continue;
            };
            let adapter = Arc::clone(adapter);
            let id = id.clone();
            let prompt = prompt.to_string();
            let context = context.clone();

            join_set.spawn(async move {
                let reply = match tokio::time::timeout(
                    timeout,
                    adapter.respond(&prompt, &context, timeout),
                )
                .await
                {
                    Ok(response) => (response, false),
                    Err(_) => (
                        ParticipantResponse::transient(format!("no response within {:?}", timeout)),
                        true,
                    ),
                };
                (id, reply)
            });
        }

        let mut replies = HashMap::new();
        loop {
            let next = match &self.cancellation_token {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        join_set.detach_all();
                        return None;
                    }
                    next = join_set.join_next() => next,
                },
                None => join_set.join_next().await,
            };

            match next {
                Some(Ok((id, reply))) => {
                    replies.insert(id, reply);
                }
                Some(Err(e)) => warn!("Participant task join error: {}", e),
                None => break,
            }
        }
        Some(replies)
    }

    /// Let the best resonating memory speak after `round`, if any
    async fn resonate(
        &self,
        session: &mut Session,
        round: u32,
        progress: &dyn DeliberationProgress,
    ) -> Result<(), Halt> {
        let mut indicators = IndicatorVector::new();
        for message in session
            .round_messages(round)
            .filter(|m| !m.is_memory_contribution())
        {
            indicators.merge(&message.indicators);
        }
        if indicators.is_empty() {
            debug!("Round {} produced no indicators, skipping resonance", round);
            return Ok(());
        }

        let snapshot = DialogueSnapshot {
            session_id: session.id().clone(),
            domain: session.domain().to_string(),
            round,
            indicators,
            spoken: session
                .messages()
                .iter()
                .filter_map(|m| m.memory_id.clone())
                .collect::<BTreeSet<_>>(),
        };

        let now = Utc::now();
        let found = match self.resonance.evaluate(&snapshot, now).await {
            Ok(Some(found)) => found,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(
                    "Resonance lookup failed for session {}: {}",
                    session.id(),
                    e
                );
                return Ok(());
            }
        };

        let content = PromptTemplate::memory_voice(&found.memory.summary, found.candidate.score);
        let draft = MessageDraft::memory(found.memory.id.clone(), content, found.memory.indicators.clone());
        let sequence = session.append_message(round, draft, now)?;
        info!(
            "Memory {} spoke in session {} after round {} (score {:.3})",
            found.memory.id,
            session.id(),
            round,
            found.candidate.score
        );
        progress.on_memory_spoke(round, &found.candidate);
        self.logger.log(ConversationEvent::new(
            "memory_spoke",
            json!({
                "session_id": session.id(),
                "round": round,
                "sequence": sequence,
                "memory_id": found.memory.id,
                "score": found.candidate.score,
                "breakdown": found.candidate.breakdown,
            }),
        ));
        Ok(())
    }

    /// Conclusion policy: round limit, or a stable score once `min_rounds`
    /// rounds have completed
    pub(super) fn conclusion_for(&self, session: &Session) -> Option<ConclusionCause> {
        let completed = session.completed_rounds();
        if completed >= self.config.max_rounds {
            return Some(ConclusionCause::MaxRounds);
        }
        if completed < self.config.min_rounds {
            return None;
        }
        match session.emergence_history() {
            [.., previous, last] if (last - previous).abs() <= self.config.convergence_epsilon => {
                Some(ConclusionCause::Converged)
            }
            _ => None,
        }
    }
}

/// The last `limit` committed messages, oldest first
fn recent_transcript(session: &Session, limit: usize) -> Vec<council_domain::Message> {
    let messages = session.messages();
    messages[messages.len().saturating_sub(limit)..].to_vec()
}
