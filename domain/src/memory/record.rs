//! Episodic memory records

use crate::core::ids::{MemoryId, SessionId};
use crate::indicator::IndicatorVector;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Durable summary of a past session or excerpt.
///
/// Read-only after creation except for the sacred flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicMemoryRecord {
    pub id: MemoryId,
    pub domain: String,
    /// Text spoken back into a live session when this memory resonates
    pub summary: String,
    pub indicators: IndicatorVector,
    pub sacred: bool,
    pub created_at: DateTime<Utc>,
    pub source_session_id: SessionId,
    /// Set when the memory was promoted from a single message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sequence: Option<u64>,
}

impl EpisodicMemoryRecord {
    /// Set the sacred flag; returns `false` if it was already set
    pub fn mark_sacred(&mut self) -> bool {
        let changed = !self.sacred;
        self.sacred = true;
        changed
    }

    pub fn is_excerpt(&self) -> bool {
        self.source_sequence.is_some()
    }
}

/// Half-open time range `[since, until)`; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
        }
    }

    /// Everything from `now - span` onwards
    pub fn last(span: Duration, now: DateTime<Utc>) -> Self {
        Self {
            since: Some(now - span),
            until: None,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| at >= since) && self.until.is_none_or(|until| at < until)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_mark_sacred_is_idempotent() {
        let mut record = EpisodicMemoryRecord {
            id: MemoryId::new("m"),
            domain: "d".to_string(),
            summary: "s".to_string(),
            indicators: IndicatorVector::new(),
            sacred: false,
            created_at: t(0),
            source_session_id: SessionId::new("s"),
            source_sequence: None,
        };
        assert!(record.mark_sacred());
        assert!(!record.mark_sacred());
        assert!(record.sacred);
        assert!(!record.is_excerpt());
    }

    #[test]
    fn test_time_window_contains() {
        let window = TimeWindow::between(t(10), t(20));
        assert!(!window.contains(t(9)));
        assert!(window.contains(t(10)));
        assert!(window.contains(t(19)));
        assert!(!window.contains(t(20)));

        assert!(TimeWindow::all().contains(t(-1_000_000)));

        let recent = TimeWindow::last(Duration::seconds(5), t(100));
        assert!(recent.contains(t(96)));
        assert!(!recent.contains(t(94)));
        assert!(recent.contains(t(500)));
    }
}
