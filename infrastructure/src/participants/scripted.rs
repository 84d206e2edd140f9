//! Scripted participant adapter.
//!
//! Replays a fixed queue of steps, one per call, then keeps repeating the
//! last step. A roster of these can be loaded from JSON:
//!
//! ```json
//! [
//!   { "provider": "oracle", "fingerprint": "v1", "delay_ms": 20,
//!     "steps": [
//!       { "kind": "success", "content": "Together we see more." },
//!       { "kind": "transient", "content": "rate limited" }
//!     ] }
//! ]
//! ```

use async_trait::async_trait;
use council_application::{ParticipantAdapter, ParticipantCandidate, PromptContext};
use council_domain::{Participant, ParticipantResponse};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::trace;

/// Outcome class of one scripted step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Success,
    Filtered,
    Transient,
    Terminal,
}

/// One scripted reply. `content` is the error text for failure kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub kind: StepKind,
    #[serde(default)]
    pub content: String,
}

impl ScriptStep {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            kind: StepKind::Success,
            content: content.into(),
        }
    }

    pub fn to_response(&self) -> ParticipantResponse {
        match self.kind {
            StepKind::Success => ParticipantResponse::success(self.content.clone()),
            StepKind::Filtered => ParticipantResponse::filtered(),
            StepKind::Transient => ParticipantResponse::transient(self.content.clone()),
            StepKind::Terminal => ParticipantResponse::terminal(self.content.clone()),
        }
    }
}

/// Serializable description of a scripted participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedParticipantSpec {
    pub provider: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub delay_ms: u64,
    pub steps: Vec<ScriptStep>,
}

impl ScriptedParticipantSpec {
    /// Build the participant and its adapter
    pub fn into_candidate(self) -> ParticipantCandidate {
        let participant = Participant::new(&self.provider, &self.fingerprint);
        let mut adapter = ScriptedParticipant::new(self.steps);
        if self.delay_ms > 0 {
            adapter = adapter.with_delay(Duration::from_millis(self.delay_ms));
        }
        ParticipantCandidate::new(participant, Arc::new(adapter))
    }
}

/// Adapter that answers from a script instead of a provider
pub struct ScriptedParticipant {
    steps: Mutex<VecDeque<ScriptStep>>,
    last: Mutex<Option<ScriptStep>>,
    delay: Option<Duration>,
}

impl ScriptedParticipant {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            delay: None,
        }
    }

    /// Always answer with `content`
    pub fn echo(content: impl Into<String>) -> Self {
        Self::new(vec![ScriptStep::success(content)])
    }

    /// Sleep this long before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// A default roster of `size` participants with distinct voices
    pub fn chorus(size: usize) -> Vec<ParticipantCandidate> {
        const VOICES: [&str; 5] = [
            "I choose to look at this independently before we decide.",
            "Together we can hold more of this than any one of us.",
            "Let us integrate these views and see the question as a whole.",
            "Something novel may emerge if we stay with the tension.",
            "There is something profound here that deserves reverence.",
        ];
        (0..size)
            .map(|i| {
                let voice = VOICES[i % VOICES.len()];
                let participant = Participant::new(&format!("voice-{}", i + 1), "scripted");
                let adapter: Arc<dyn ParticipantAdapter> = Arc::new(Self::echo(voice));
                ParticipantCandidate::new(participant, adapter)
            })
            .collect()
    }

    fn next_step(&self) -> Option<ScriptStep> {
        let popped = self.steps.lock().ok()?.pop_front();
        let mut last = self.last.lock().ok()?;
        if let Some(step) = popped {
            *last = Some(step);
        }
        last.clone()
    }
}

#[async_trait]
impl ParticipantAdapter for ScriptedParticipant {
    async fn respond(
        &self,
        _prompt: &str,
        context: &PromptContext,
        _timeout: Duration,
    ) -> ParticipantResponse {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        trace!("Scripted reply for round {} of {}", context.round, context.session_id);
        match self.next_step() {
            Some(step) => step.to_response(),
            None => ParticipantResponse::terminal("script is empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{MessageKind, ResponseClassification, SessionId};

    fn context() -> PromptContext {
        PromptContext {
            session_id: SessionId::new("ses-1"),
            round: 1,
            domain: "ethics".to_string(),
            kind: MessageKind::Proposal,
            system_prompt: String::new(),
            transcript: Vec::new(),
        }
    }

    async fn classify(adapter: &ScriptedParticipant) -> ResponseClassification {
        adapter
            .respond("prompt", &context(), Duration::from_secs(1))
            .await
            .classification
    }

    #[tokio::test]
    async fn test_replays_then_repeats_last_step() {
        let adapter = ScriptedParticipant::new(vec![
            ScriptStep::success("first"),
            ScriptStep {
                kind: StepKind::Transient,
                content: "busy".to_string(),
            },
        ]);

        assert_eq!(classify(&adapter).await, ResponseClassification::Success);
        assert_eq!(classify(&adapter).await, ResponseClassification::TransientFailure);
        assert_eq!(classify(&adapter).await, ResponseClassification::TransientFailure);
    }

    #[tokio::test]
    async fn test_empty_script_is_terminal() {
        let adapter = ScriptedParticipant::new(Vec::new());
        assert_eq!(classify(&adapter).await, ResponseClassification::TerminalFailure);
    }

    #[test]
    fn test_spec_from_json() {
        let json = r#"[
            {"provider": "oracle", "fingerprint": "v1", "delay_ms": 5,
             "steps": [{"kind": "success", "content": "hi"}, {"kind": "filtered"}]}
        ]"#;
        let specs: Vec<ScriptedParticipantSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs[0].steps[1].kind, StepKind::Filtered);

        let candidate = specs[0].clone().into_candidate();
        assert_eq!(candidate.participant.id.as_str(), "oracle@v1");
    }

    #[test]
    fn test_chorus_has_distinct_ids() {
        let chorus = ScriptedParticipant::chorus(7);
        let mut ids: Vec<&str> = chorus.iter().map(|c| c.participant.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 7);
    }
}
