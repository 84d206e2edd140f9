//! Participant adapter port
//!
//! Defines the contract every AI provider integration implements. Provider
//! specific failures are normalized into a [`ResponseClassification`] at this
//! boundary; the orchestrator never sees a provider error type.

use async_trait::async_trait;
use council_domain::{
    Message, MessageKind, Participant, ParticipantResponse, SessionId,
};
use std::sync::Arc;
use std::time::Duration;

/// Everything an adapter may need besides the prompt text itself
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub session_id: SessionId,
    pub round: u32,
    pub domain: String,
    /// Kind the participant's message will be recorded as
    pub kind: MessageKind,
    /// System preamble for providers that support one
    pub system_prompt: String,
    /// Most recent committed messages, oldest first
    pub transcript: Vec<Message>,
}

/// Gateway to one AI response provider
///
/// Implementations must not panic on provider errors. Anything that goes
/// wrong is reported through the response classification:
///
/// - content blocked by the provider's own safety layer → `Filtered`
/// - retryable errors (rate limits, 5xx, network) → `TransientFailure`
/// - everything else (auth, unknown model) → `TerminalFailure`
#[async_trait]
pub trait ParticipantAdapter: Send + Sync {
    /// Ask the participant to respond to `prompt`.
    ///
    /// `timeout` is advisory; the orchestrator enforces it independently.
    async fn respond(
        &self,
        prompt: &str,
        context: &PromptContext,
        timeout: Duration,
    ) -> ParticipantResponse;
}

/// A participant offered to the orchestrator at session formation
#[derive(Clone)]
pub struct ParticipantCandidate {
    pub participant: Participant,
    pub adapter: Arc<dyn ParticipantAdapter>,
}

impl ParticipantCandidate {
    pub fn new(participant: Participant, adapter: Arc<dyn ParticipantAdapter>) -> Self {
        Self {
            participant,
            adapter,
        }
    }
}

impl std::fmt::Debug for ParticipantCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticipantCandidate")
            .field("participant", &self.participant.id)
            .finish_non_exhaustive()
    }
}
