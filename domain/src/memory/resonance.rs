//! Memory resonance scoring.
//!
//! ```text
//! score = sacred_bonus + alignment + pattern_overlap + temporal_relevance
//! ```
//!
//! Each term is a raw value in `[0, 1]` scaled by its cap, so no term can
//! exceed its cap; the sum is clamped to `[0, 1]`.
//!
//! | Term                 | Raw value                                   |
//! |----------------------|---------------------------------------------|
//! | `sacred_bonus`       | 1 if the memory is sacred, else 0           |
//! | `alignment`          | cosine similarity of the indicator counts   |
//! | `pattern_overlap`    | Jaccard index of the indicator tag sets     |
//! | `temporal_relevance` | `0.5^(age / half_life)`                     |

use super::record::EpisodicMemoryRecord;
use crate::core::ids::{MemoryId, SessionId};
use crate::indicator::IndicatorVector;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Caps and thresholds for resonance scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonancePolicy {
    /// Minimum score for a memory to speak
    pub speaking_threshold: f64,
    pub sacred_cap: f64,
    pub alignment_cap: f64,
    pub pattern_cap: f64,
    pub temporal_cap: f64,
    /// Age at which temporal relevance halves
    pub half_life_days: f64,
}

impl Default for ResonancePolicy {
    fn default() -> Self {
        Self {
            speaking_threshold: 0.85,
            sacred_cap: 0.2,
            alignment_cap: 0.3,
            pattern_cap: 0.3,
            temporal_cap: 0.2,
            half_life_days: 30.0,
        }
    }
}

impl ResonancePolicy {
    /// Highest score any memory could reach under these caps
    pub fn max_attainable(&self) -> f64 {
        (self.sacred_cap + self.alignment_cap + self.pattern_cap + self.temporal_cap).min(1.0)
    }

    /// Score one memory against the current dialogue vector
    pub fn score(
        &self,
        current: &IndicatorVector,
        memory: &EpisodicMemoryRecord,
        now: DateTime<Utc>,
    ) -> ResonanceBreakdown {
        let sacred = if memory.sacred { 1.0 } else { 0.0 };
        let alignment = current.cosine_similarity(&memory.indicators);
        let overlap = current.jaccard_index(&memory.indicators);
        let temporal = self.temporal_decay(memory.created_at, now);

        ResonanceBreakdown {
            sacred_bonus: sacred * self.sacred_cap,
            alignment: alignment * self.alignment_cap,
            pattern_overlap: overlap * self.pattern_cap,
            temporal_relevance: temporal * self.temporal_cap,
        }
        .capped(self)
    }

    /// Raw temporal relevance in `[0, 1]`; timestamps in the future count
    /// as brand new
    fn temporal_decay(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_days = (now - created_at).num_seconds().max(0) as f64 / SECONDS_PER_DAY;
        if self.half_life_days <= 0.0 {
            return if age_days == 0.0 { 1.0 } else { 0.0 };
        }
        0.5_f64.powf(age_days / self.half_life_days)
    }
}

/// Individual resonance terms, each already scaled by its cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResonanceBreakdown {
    pub sacred_bonus: f64,
    pub alignment: f64,
    pub pattern_overlap: f64,
    pub temporal_relevance: f64,
}

impl ResonanceBreakdown {
    /// Clamp every term into `[0, cap]`
    pub fn capped(self, policy: &ResonancePolicy) -> Self {
        let cap = |value: f64, cap: f64| {
            if value.is_finite() {
                value.clamp(0.0, cap.max(0.0))
            } else {
                0.0
            }
        };
        Self {
            sacred_bonus: cap(self.sacred_bonus, policy.sacred_cap),
            alignment: cap(self.alignment, policy.alignment_cap),
            pattern_overlap: cap(self.pattern_overlap, policy.pattern_cap),
            temporal_relevance: cap(self.temporal_relevance, policy.temporal_cap),
        }
    }

    /// Final score in `[0, 1]`
    pub fn total(&self) -> f64 {
        (self.sacred_bonus + self.alignment + self.pattern_overlap + self.temporal_relevance)
            .clamp(0.0, 1.0)
    }
}

/// Transient pairing of a live session with a scored memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResonanceCandidate {
    pub session_id: SessionId,
    pub memory_id: MemoryId,
    pub score: f64,
    pub breakdown: ResonanceBreakdown,
    pub computed_at: DateTime<Utc>,
}

impl ResonanceCandidate {
    pub fn new(
        session_id: SessionId,
        memory_id: MemoryId,
        breakdown: ResonanceBreakdown,
        computed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id,
            memory_id,
            score: breakdown.total(),
            breakdown,
            computed_at,
        }
    }

    /// Whether this candidate may become a memory contribution
    pub fn is_eligible(&self, policy: &ResonancePolicy) -> bool {
        self.score >= policy.speaking_threshold
    }
}
