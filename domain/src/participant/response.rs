//! Normalized participant response contract.
//!
//! Provider adapters translate whatever their service returns into a
//! [`ParticipantResponse`] before anything enters the core.

use crate::core::reason::ReasonCode;
use serde::{Deserialize, Serialize};

/// Classification of a single participant response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseClassification {
    /// A usable answer
    Success,
    /// Blocked or redacted by the provider's own safety layer
    Filtered,
    /// Retryable failure (rate limit, network blip, timeout)
    TransientFailure,
    /// Non-retryable failure (revoked credentials, removed model)
    TerminalFailure,
}

impl ResponseClassification {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseClassification::Success)
    }

    /// Reason code recorded for failed classifications
    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            ResponseClassification::TransientFailure => Some(ReasonCode::TransientFailure),
            ResponseClassification::TerminalFailure => Some(ReasonCode::TerminalFailure),
            _ => None,
        }
    }
}

/// A participant's reply to one round prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantResponse {
    pub content: String,
    pub classification: ResponseClassification,
    /// Indicator tags the adapter reported alongside the content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indicator_hints: Vec<String>,
    /// Failure detail for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ParticipantResponse {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            classification: ResponseClassification::Success,
            indicator_hints: Vec::new(),
            error: None,
        }
    }

    pub fn filtered() -> Self {
        Self {
            content: String::new(),
            classification: ResponseClassification::Filtered,
            indicator_hints: Vec::new(),
            error: None,
        }
    }

    pub fn transient(error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            classification: ResponseClassification::TransientFailure,
            indicator_hints: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn terminal(error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            classification: ResponseClassification::TerminalFailure,
            indicator_hints: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indicator_hints = hints.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert!(ParticipantResponse::success("hi").classification.is_success());
        assert_eq!(
            ParticipantResponse::filtered().classification,
            ResponseClassification::Filtered
        );
        let t = ParticipantResponse::terminal("revoked");
        assert_eq!(t.error.as_deref(), Some("revoked"));
        assert_eq!(
            t.classification.reason_code(),
            Some(ReasonCode::TerminalFailure)
        );
        assert_eq!(ResponseClassification::Filtered.reason_code(), None);
    }
}
