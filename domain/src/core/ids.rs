//! Identifier value objects.
//!
//! All identifiers are string newtypes so they serialize transparently into
//! stored documents and stay readable in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique id of a deliberation session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(format!("ses-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of a participant: provider id plus configuration fingerprint.
///
/// Two participants backed by the same provider but configured differently
/// (model, temperature, system prompt) have distinct health histories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(provider: &str, fingerprint: &str) -> Self {
        if fingerprint.is_empty() {
            Self(provider.to_string())
        } else {
            Self(format!("{}@{}", provider, fingerprint))
        }
    }

    /// Build from an already rendered `provider@fingerprint` string
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn provider(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique id of an episodic memory record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryId(String);

impl MemoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id of the memory synthesized when a session concludes.
    pub fn for_session(session_id: &SessionId) -> Self {
        Self(format!("mem-{}", session_id.as_str()))
    }

    /// Deterministic id of a memory promoted from a single message.
    pub fn for_excerpt(session_id: &SessionId, sequence: u64) -> Self {
        Self(format!("mem-{}-{}", session_id.as_str(), sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )*
    };
}

impl_display!(SessionId, ParticipantId, MemoryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_id_format() {
        let id = ParticipantId::new("anthropic", "sonnet-t07");
        assert_eq!(id.as_str(), "anthropic@sonnet-t07");
        assert_eq!(id.provider(), "anthropic");

        let bare = ParticipantId::new("local", "");
        assert_eq!(bare.as_str(), "local");
        assert_eq!(bare.provider(), "local");
    }

    #[test]
    fn test_memory_ids_are_deterministic() {
        let session = SessionId::new("ses-42");
        assert_eq!(MemoryId::for_session(&session).as_str(), "mem-ses-42");
        assert_eq!(MemoryId::for_excerpt(&session, 7).as_str(), "mem-ses-42-7");
    }

    #[test]
    fn test_generated_session_ids_are_unique() {
        assert_ne!(SessionId::generate(), SessionId::generate());
        assert!(SessionId::generate().as_str().starts_with("ses-"));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&SessionId::new("ses-1")).unwrap();
        assert_eq!(json, "\"ses-1\"");
    }
}
