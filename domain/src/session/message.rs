//! Session messages

use crate::core::ids::{MemoryId, ParticipantId, SessionId};
use crate::indicator::IndicatorVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    Participant(ParticipantId),
    /// The reserved author of memory contributions
    Memory,
}

impl Author {
    pub fn participant_id(&self) -> Option<&ParticipantId> {
        match self {
            Author::Participant(id) => Some(id),
            Author::Memory => None,
        }
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, Author::Memory)
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::Participant(id) => write!(f, "{}", id),
            Author::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Proposal,
    Response,
    Reflection,
    MemoryContribution,
}

impl MessageKind {
    /// Kind of participant messages produced in `round` of a session
    /// allowing at most `max_rounds` rounds.
    pub fn for_round(round: u32, max_rounds: u32) -> Self {
        if round <= 1 {
            MessageKind::Proposal
        } else if round >= max_rounds {
            MessageKind::Reflection
        } else {
            MessageKind::Response
        }
    }
}

/// A committed message (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub session_id: SessionId,
    pub round: u32,
    /// 1-based, gapless, assigned only by the session
    pub sequence: u64,
    pub author: Author,
    pub kind: MessageKind,
    pub content: String,
    pub indicators: IndicatorVector,
    /// Source memory of a memory contribution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<MemoryId>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_memory_contribution(&self) -> bool {
        self.kind == MessageKind::MemoryContribution
    }
}

/// Content of a message before the session assigns its sequence number
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDraft {
    pub author: Author,
    pub kind: MessageKind,
    pub content: String,
    pub indicators: IndicatorVector,
    pub memory_id: Option<MemoryId>,
}

impl MessageDraft {
    pub fn participant(
        id: ParticipantId,
        kind: MessageKind,
        content: impl Into<String>,
        indicators: IndicatorVector,
    ) -> Self {
        Self {
            author: Author::Participant(id),
            kind,
            content: content.into(),
            indicators,
            memory_id: None,
        }
    }

    pub fn memory(memory_id: MemoryId, content: impl Into<String>, indicators: IndicatorVector) -> Self {
        Self {
            author: Author::Memory,
            kind: MessageKind::MemoryContribution,
            content: content.into(),
            indicators,
            memory_id: Some(memory_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_round() {
        assert_eq!(MessageKind::for_round(1, 4), MessageKind::Proposal);
        assert_eq!(MessageKind::for_round(2, 4), MessageKind::Response);
        assert_eq!(MessageKind::for_round(3, 4), MessageKind::Response);
        assert_eq!(MessageKind::for_round(4, 4), MessageKind::Reflection);
        // A single-round session only ever proposes
        assert_eq!(MessageKind::for_round(1, 1), MessageKind::Proposal);
    }

    #[test]
    fn test_author_serde() {
        let memory = serde_json::to_string(&Author::Memory).unwrap();
        assert_eq!(memory, "\"memory\"");

        let participant = Author::Participant(ParticipantId::new("p", "f"));
        let json = serde_json::to_string(&participant).unwrap();
        assert_eq!(json, r#"{"participant":"p@f"}"#);
        let back: Author = serde_json::from_str(&json).unwrap();
        assert_eq!(back, participant);
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&MessageKind::MemoryContribution).unwrap();
        assert_eq!(json, "\"memory-contribution\"");
    }

    #[test]
    fn test_memory_draft() {
        let draft = MessageDraft::memory(MemoryId::new("m"), "echo", IndicatorVector::new());
        assert!(draft.author.is_memory());
        assert_eq!(draft.kind, MessageKind::MemoryContribution);
        assert_eq!(draft.memory_id, Some(MemoryId::new("m")));
    }
}
