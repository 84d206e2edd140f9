//! Reason codes reported for session failures and recovered errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error taxonomy shared by every layer.
///
/// Fatal codes end a session (or its conclusion attempt); the remaining
/// codes are recovered locally and only show up in health snapshots and
/// metrics records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    InsufficientQuorum,
    QuorumLost,
    ParticipantTimeout,
    TransientFailure,
    TerminalFailure,
    PersistenceConflict,
    PersistenceFailure,
    Cancelled,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::InsufficientQuorum => "INSUFFICIENT_QUORUM",
            ReasonCode::QuorumLost => "QUORUM_LOST",
            ReasonCode::ParticipantTimeout => "PARTICIPANT_TIMEOUT",
            ReasonCode::TransientFailure => "TRANSIENT_FAILURE",
            ReasonCode::TerminalFailure => "TERMINAL_FAILURE",
            ReasonCode::PersistenceConflict => "PERSISTENCE_CONFLICT",
            ReasonCode::PersistenceFailure => "PERSISTENCE_FAILURE",
            ReasonCode::Cancelled => "CANCELLED",
        }
    }

    /// Whether this reason ends the session (or the conclusion attempt)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReasonCode::InsufficientQuorum
                | ReasonCode::QuorumLost
                | ReasonCode::PersistenceFailure
                | ReasonCode::Cancelled
        )
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
