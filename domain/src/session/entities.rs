//! Session domain entities
//!
//! [`Session`] owns its state machine: every mutation goes through a method
//! that checks the current state, so an archived session cannot change and
//! message sequence numbers can only be assigned here.

use super::message::{Message, MessageDraft};
use super::state::{ConclusionCause, SessionState};
use crate::core::error::DomainError;
use crate::core::ids::{ParticipantId, SessionId};
use crate::core::reason::ReasonCode;
use crate::metrics::SacredMoment;
use crate::participant::{Participant, ResponseClassification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A participant's place in a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub participant: Participant,
    /// Set after a terminal failure; degraded participants sit out every
    /// later round
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degraded_in_round: Option<u32>,
}

/// How one participant fared in one round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub participant_id: ParticipantId,
    pub classification: ResponseClassification,
    #[serde(default)]
    pub timed_out: bool,
    /// Sequence of the committed message, for successful responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_sequence: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<RoundOutcome>,
    /// Running emergence score after this round
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergence_score: Option<f64>,
}

impl Round {
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn count(&self, classification: ResponseClassification) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.classification == classification)
            .count()
    }
}

/// A bounded multi-round deliberation (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    domain: String,
    topic: String,
    state: SessionState,
    participants: Vec<Enrollment>,
    rounds: Vec<Round>,
    messages: Vec<Message>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    concluded_at: Option<DateTime<Utc>>,
    emergence_score: f64,
    #[serde(default)]
    emergence_history: Vec<f64>,
    #[serde(default)]
    sacred_moments: Vec<SacredMoment>,
    #[serde(default)]
    failure: Option<ReasonCode>,
    #[serde(default)]
    conclusion: Option<ConclusionCause>,
    /// Storage version last observed for this session (0 = never stored)
    #[serde(default)]
    version: u64,
}

impl Session {
    pub fn new(
        id: SessionId,
        domain: impl Into<String>,
        topic: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            domain: domain.into(),
            topic: topic.into(),
            state: SessionState::Forming,
            participants: Vec::new(),
            rounds: Vec::new(),
            messages: Vec::new(),
            created_at: now,
            concluded_at: None,
            emergence_score: 0.0,
            emergence_history: Vec::new(),
            sacred_moments: Vec::new(),
            failure: None,
            conclusion: None,
            version: 0,
        }
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn participants(&self) -> &[Enrollment] {
        &self.participants
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn concluded_at(&self) -> Option<DateTime<Utc>> {
        self.concluded_at
    }

    pub fn emergence_score(&self) -> f64 {
        self.emergence_score
    }

    pub fn emergence_history(&self) -> &[f64] {
        &self.emergence_history
    }

    pub fn sacred_moments(&self) -> &[SacredMoment] {
        &self.sacred_moments
    }

    pub fn failure(&self) -> Option<ReasonCode> {
        self.failure
    }

    pub fn conclusion(&self) -> Option<ConclusionCause> {
        self.conclusion
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record the storage version after a successful save or load
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Whether `other` is a copy of this same deliberation: same id, domain,
    /// topic, creation time and roster. Copies of one lineage may differ in
    /// state, rounds and version.
    pub fn same_lineage(&self, other: &Session) -> bool {
        self.id == other.id
            && self.domain == other.domain
            && self.topic == other.topic
            && self.created_at == other.created_at
            && self
                .participants
                .iter()
                .map(|e| &e.participant.id)
                .eq(other.participants.iter().map(|e| &e.participant.id))
    }

    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn completed_rounds(&self) -> u32 {
        self.rounds.iter().filter(|r| r.is_complete()).count() as u32
    }

    pub fn last_sequence(&self) -> u64 {
        self.messages.last().map(|m| m.sequence).unwrap_or(0)
    }

    pub fn is_enrolled(&self, id: &ParticipantId) -> bool {
        self.participants.iter().any(|e| &e.participant.id == id)
    }

    /// Enrolled participants that are not degraded
    pub fn active_participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants
            .iter()
            .filter(|e| !e.degraded)
            .map(|e| &e.participant)
    }

    pub fn active_count(&self) -> usize {
        self.participants.iter().filter(|e| !e.degraded).count()
    }

    /// Messages of a single round, in sequence order
    pub fn round_messages(&self, round: u32) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(move |m| m.round == round)
    }

    // ==================== Formation ====================

    pub fn enroll(&mut self, participant: Participant) -> Result<(), DomainError> {
        self.ensure_state(SessionState::Forming, SessionState::Forming)?;
        if self.is_enrolled(&participant.id) {
            return Err(DomainError::AlreadyEnrolled(participant.id.to_string()));
        }
        self.participants.push(Enrollment {
            participant,
            degraded: false,
            degraded_in_round: None,
        });
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), DomainError> {
        self.transition(SessionState::Active)
    }

    // ==================== Rounds ====================

    /// Open the next round and return its number
    pub fn begin_round(&mut self, now: DateTime<Utc>) -> Result<u32, DomainError> {
        self.ensure_state(SessionState::Active, SessionState::Active)?;
        let number = self.rounds.last().map(|r| r.number + 1).unwrap_or(1);
        self.rounds.push(Round {
            number,
            started_at: now,
            completed_at: None,
            outcomes: Vec::new(),
            emergence_score: None,
        });
        Ok(number)
    }

    /// Commit a message, assigning the next sequence number.
    ///
    /// Memory contributions are appended to the round they follow, after
    /// that round has completed.
    pub fn append_message(
        &mut self,
        round: u32,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        self.ensure_state(SessionState::Active, SessionState::Active)?;
        self.ensure_current_round(round)?;
        if let Some(id) = draft.author.participant_id()
            && !self.is_enrolled(id)
        {
            return Err(DomainError::UnknownParticipant(id.to_string()));
        }
        let sequence = self.last_sequence() + 1;
        self.messages.push(Message {
            session_id: self.id.clone(),
            round,
            sequence,
            author: draft.author,
            kind: draft.kind,
            content: draft.content,
            indicators: draft.indicators,
            memory_id: draft.memory_id,
            created_at: now,
        });
        Ok(sequence)
    }

    pub fn record_outcome(&mut self, round: u32, outcome: RoundOutcome) -> Result<(), DomainError> {
        self.ensure_state(SessionState::Active, SessionState::Active)?;
        self.ensure_current_round(round)?;
        if !self.is_enrolled(&outcome.participant_id) {
            return Err(DomainError::UnknownParticipant(
                outcome.participant_id.to_string(),
            ));
        }
        if let Some(current) = self.rounds.last_mut() {
            current.outcomes.push(outcome);
        }
        Ok(())
    }

    /// Exclude a participant from every later round of this session
    pub fn mark_degraded(&mut self, id: &ParticipantId, round: u32) -> Result<(), DomainError> {
        self.ensure_state(SessionState::Active, SessionState::Active)?;
        let enrollment = self
            .participants
            .iter_mut()
            .find(|e| &e.participant.id == id)
            .ok_or_else(|| DomainError::UnknownParticipant(id.to_string()))?;
        if !enrollment.degraded {
            enrollment.degraded = true;
            enrollment.degraded_in_round = Some(round);
        }
        Ok(())
    }

    /// Close the current round with its running emergence score
    pub fn complete_round(&mut self, score: f64, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_state(SessionState::Active, SessionState::Active)?;
        let current = self.rounds.last_mut().ok_or(DomainError::RoundMismatch {
            round: 0,
            current: 0,
        })?;
        current.completed_at = Some(now);
        current.emergence_score = Some(score);
        self.emergence_score = score;
        self.emergence_history.push(score);
        Ok(())
    }

    pub fn add_sacred_moment(&mut self, moment: SacredMoment) -> Result<(), DomainError> {
        self.ensure_state(SessionState::Active, SessionState::Active)?;
        self.sacred_moments.push(moment);
        Ok(())
    }

    // ==================== Termination ====================

    pub fn fail(&mut self, reason: ReasonCode, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(SessionState::Failed)?;
        self.failure = Some(reason);
        self.concluded_at = Some(now);
        Ok(())
    }

    pub fn begin_concluding(&mut self, cause: ConclusionCause) -> Result<(), DomainError> {
        self.transition(SessionState::Concluding)?;
        self.conclusion = Some(cause);
        Ok(())
    }

    pub fn archive(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.transition(SessionState::Archived)?;
        self.concluded_at = Some(now);
        Ok(())
    }

    fn transition(&mut self, next: SessionState) -> Result<(), DomainError> {
        if self.state == SessionState::Archived {
            return Err(DomainError::SessionArchived(self.id.to_string()));
        }
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    fn ensure_state(&self, expected: SessionState, attempted: SessionState) -> Result<(), DomainError> {
        if self.state == SessionState::Archived {
            return Err(DomainError::SessionArchived(self.id.to_string()));
        }
        if self.state != expected {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: attempted,
            });
        }
        Ok(())
    }

    fn ensure_current_round(&self, round: u32) -> Result<(), DomainError> {
        let current = self.rounds.last().map(|r| r.number).unwrap_or(0);
        if current == 0 || round != current {
            return Err(DomainError::RoundMismatch { round, current });
        }
        Ok(())
    }
}
