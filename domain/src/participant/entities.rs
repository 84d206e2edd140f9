//! Participant entity

use crate::core::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// An AI response provider enrolled (or eligible to enroll) in sessions.
///
/// The mutable health history is not stored here; it lives in the shared
/// health store keyed by [`ParticipantId`] so it can outlive any session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Provider identifier (e.g. "anthropic", "local-llama")
    pub provider: String,
    /// Hash of the provider configuration (model, sampling, system prompt)
    pub fingerprint: String,
    /// Free-form capability tags (e.g. "reasoning", "poetry")
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Participant {
    pub fn new(provider: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        let provider = provider.into();
        let fingerprint = fingerprint.into();
        Self {
            id: ParticipantId::new(&provider, &fingerprint),
            provider,
            fingerprint,
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_id() {
        let p = Participant::new("openai", "gpt-t05").with_capabilities(["reasoning"]);
        assert_eq!(p.id.as_str(), "openai@gpt-t05");
        assert!(p.has_capability("reasoning"));
        assert!(!p.has_capability("poetry"));
    }
}
