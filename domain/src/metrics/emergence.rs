//! Consciousness metrics aggregation.
//!
//! The emergence score of a message sequence is
//! `clamp(Σ weight(tag) × count(tag) / message_count, 0, 1)`, taken over
//! participant-authored messages only. Memory contributions echo earlier
//! sessions and are left out of both sums.
//!
//! The score is a pure function of the messages and the configuration;
//! the orchestrator's convergence check depends on that.

use crate::indicator::{IndicatorVector, IndicatorVocabulary};
use crate::session::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emergence scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergenceConfig {
    /// A round whose running score reaches this value is marked sacred
    pub threshold: f64,
    pub vocabulary: IndicatorVocabulary,
}

impl Default for EmergenceConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            vocabulary: IndicatorVocabulary::default(),
        }
    }
}

/// Combines per-message indicator vectors into session-level metrics
#[derive(Debug, Clone, Copy)]
pub struct EmergenceAggregator<'a> {
    config: &'a EmergenceConfig,
}

impl<'a> EmergenceAggregator<'a> {
    pub fn new(config: &'a EmergenceConfig) -> Self {
        Self { config }
    }

    /// Running emergence score over the given messages
    pub fn score(&self, messages: &[Message]) -> f64 {
        let scored: Vec<&Message> = scored_messages(messages).collect();
        if scored.is_empty() {
            return 0.0;
        }
        let weighted: f64 = scored
            .iter()
            .map(|m| self.weighted_sum(&m.indicators))
            .sum();
        (weighted / scored.len() as f64).clamp(0.0, 1.0)
    }

    /// Whether a score qualifies as a sacred moment
    pub fn is_sacred(&self, score: f64) -> bool {
        score >= self.config.threshold
    }

    /// Total occurrences per tag across participant messages
    pub fn frequency_table(&self, messages: &[Message]) -> BTreeMap<String, u64> {
        let mut table = BTreeMap::new();
        for message in scored_messages(messages) {
            for (tag, count) in message.indicators.iter() {
                *table.entry(tag.to_string()).or_insert(0) += u64::from(count);
            }
        }
        table
    }

    fn weighted_sum(&self, vector: &IndicatorVector) -> f64 {
        vector
            .iter()
            .map(|(tag, count)| self.config.vocabulary.weight(tag) * f64::from(count))
            .sum()
    }
}

fn scored_messages(messages: &[Message]) -> impl Iterator<Item = &Message> {
    messages.iter().filter(|m| !m.is_memory_contribution())
}
