//! Metrics records and sacred-moment markers.

use crate::core::ids::SessionId;
use crate::participant::HealthSnapshot;
use crate::session::state::ConclusionCause;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marker appended when a round's running emergence score reaches the
/// emergence threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SacredMoment {
    pub round: u32,
    pub score: f64,
    /// Sequence number of the last message of the round
    pub after_sequence: u64,
    pub at: DateTime<Utc>,
}

/// Per-session metrics, written once when the session is archived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub session_id: SessionId,
    pub domain: String,
    pub final_emergence_score: f64,
    pub indicator_frequency: BTreeMap<String, u64>,
    pub sacred_moments: Vec<SacredMoment>,
    pub health_snapshot: Vec<HealthSnapshot>,
    pub rounds_completed: u32,
    pub message_count: usize,
    pub conclusion: ConclusionCause,
    pub concluded_at: DateTime<Utc>,
}

impl MetricsRecord {
    pub fn has_sacred_moments(&self) -> bool {
        !self.sacred_moments.is_empty()
    }

    /// Most frequent indicator tag, ties resolved alphabetically
    pub fn dominant_indicator(&self) -> Option<&str> {
        self.indicator_frequency
            .iter()
            .filter(|(_, count)| **count > 0)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(tag, _)| tag.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(freq: &[(&str, u64)]) -> MetricsRecord {
        MetricsRecord {
            session_id: SessionId::new("s"),
            domain: "ethics".to_string(),
            final_emergence_score: 0.4,
            indicator_frequency: freq.iter().map(|(t, c)| (t.to_string(), *c)).collect(),
            sacred_moments: vec![],
            health_snapshot: vec![],
            rounds_completed: 3,
            message_count: 9,
            conclusion: ConclusionCause::MaxRounds,
            concluded_at: Utc::now(),
        }
    }

    #[test]
    fn test_dominant_indicator() {
        assert_eq!(
            record(&[("a", 2), ("b", 5), ("c", 5)]).dominant_indicator(),
            Some("b")
        );
        assert_eq!(record(&[("a", 0)]).dominant_indicator(), None);
        assert_eq!(record(&[]).dominant_indicator(), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let original = record(&[("a", 1)]);
        let json = serde_json::to_string(&original).unwrap();
        let back: MetricsRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
        assert!(!back.has_sacred_moments());
    }
}
