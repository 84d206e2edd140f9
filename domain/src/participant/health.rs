//! Participant health record.
//!
//! A bounded trailing window of response outcomes. Filtered responses are
//! kept in a separate window and never enter the success ratio: they reflect
//! the provider's content policy, not its ability to answer. A filtered
//! response therefore never evicts a success or failure.

use super::response::ResponseClassification;
use crate::core::ids::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded response outcome
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub kind: ResponseClassification,
    pub at: DateTime<Utc>,
}

/// Outcome counts over the current window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub successes: usize,
    pub filtered: usize,
    pub transient_failures: usize,
    pub terminal_failures: usize,
}

impl OutcomeCounts {
    /// successes / (successes + transient + terminal); 1.0 with no evidence
    pub fn success_ratio(&self) -> f64 {
        let denominator = self.successes + self.transient_failures + self.terminal_failures;
        if denominator == 0 {
            return 1.0;
        }
        self.successes as f64 / denominator as f64
    }
}

/// Rolling health history of one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    capacity: usize,
    /// Success and failure outcomes only
    events: VecDeque<OutcomeEvent>,
    filtered: VecDeque<DateTime<Utc>>,
    /// Survives window eviction; used to break ranking ties
    last_success_at: Option<DateTime<Utc>>,
}

impl HealthRecord {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
            filtered: VecDeque::new(),
            last_success_at: None,
        }
    }

    pub fn record(&mut self, kind: ResponseClassification, at: DateTime<Utc>) {
        if kind == ResponseClassification::Filtered {
            self.filtered.push_back(at);
            while self.filtered.len() > self.capacity {
                self.filtered.pop_front();
            }
            return;
        }
        if kind.is_success() {
            self.last_success_at = Some(match self.last_success_at {
                Some(prev) if prev > at => prev,
                _ => at,
            });
        }
        self.events.push_back(OutcomeEvent { kind, at });
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts {
            filtered: self.filtered.len(),
            ..OutcomeCounts::default()
        };
        for event in &self.events {
            match event.kind {
                ResponseClassification::Success => counts.successes += 1,
                ResponseClassification::Filtered => {}
                ResponseClassification::TransientFailure => counts.transient_failures += 1,
                ResponseClassification::TerminalFailure => counts.terminal_failures += 1,
            }
        }
        counts
    }

    pub fn success_ratio(&self) -> f64 {
        self.counts().success_ratio()
    }

    pub fn last_success_at(&self) -> Option<DateTime<Utc>> {
        self.last_success_at
    }

    /// Success and failure outcomes in the window, oldest first
    pub fn events(&self) -> impl Iterator<Item = &OutcomeEvent> {
        self.events.iter()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self, participant_id: &ParticipantId) -> HealthSnapshot {
        let counts = self.counts();
        HealthSnapshot {
            participant_id: participant_id.clone(),
            counts,
            success_ratio: counts.success_ratio(),
            last_success_at: self.last_success_at,
        }
    }
}

/// Point-in-time copy of a health record, stored in metrics records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub participant_id: ParticipantId,
    pub counts: OutcomeCounts,
    pub success_ratio: f64,
    pub last_success_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    /// Snapshot of a participant with no recorded history
    pub fn empty(participant_id: &ParticipantId) -> Self {
        Self {
            participant_id: participant_id.clone(),
            counts: OutcomeCounts::default(),
            success_ratio: 1.0,
            last_success_at: None,
        }
    }
}
