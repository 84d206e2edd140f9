//! Deliberation configuration.
//!
//! [`DeliberationConfig`] carries every tunable the orchestrator, the
//! resonance engine and the health tracker read. Defaults match a five seat
//! council with majority quorum.

use crate::config::RetryPolicy;
use council_domain::config::{ConfigIssue, ConfigIssueCode};
use council_domain::{EmergenceConfig, QuorumRule, ResonancePolicy};
use std::time::Duration;

/// Memory retrieval and candidate caching for the resonance engine
#[derive(Debug, Clone, PartialEq)]
pub struct ResonanceSettings {
    pub policy: ResonancePolicy,
    /// Only memories newer than this are considered (`None` = no limit)
    pub recency_window: Option<chrono::Duration>,
    /// Upper bound on memories fetched per evaluation
    pub candidate_limit: usize,
    /// Lifetime of a cached candidate
    pub candidate_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for ResonanceSettings {
    fn default() -> Self {
        Self {
            policy: ResonancePolicy::default(),
            recency_window: Some(chrono::Duration::days(365)),
            candidate_limit: 50,
            candidate_ttl: Duration::from_secs(300),
            cache_capacity: 512,
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DeliberationConfig {
    /// Seats the orchestrator tries to fill at formation
    pub target_participants: usize,
    pub quorum: QuorumRule,
    pub max_rounds: u32,
    /// Convergence is not checked before this many rounds have completed
    pub min_rounds: u32,
    pub participant_timeout: Duration,
    /// Score change at or below which two consecutive rounds count as converged
    pub convergence_epsilon: f64,
    /// Number of recent messages quoted back into each prompt
    pub transcript_context: usize,
    pub emergence: EmergenceConfig,
    pub resonance: ResonanceSettings,
    /// Trailing window size of each participant's health record
    pub health_window: usize,
    pub retry: RetryPolicy,
}

impl Default for DeliberationConfig {
    fn default() -> Self {
        Self {
            target_participants: 5,
            quorum: QuorumRule::Majority,
            max_rounds: 5,
            min_rounds: 2,
            participant_timeout: Duration::from_secs(60),
            convergence_epsilon: 0.01,
            transcript_context: 10,
            emergence: EmergenceConfig::default(),
            resonance: ResonanceSettings::default(),
            health_window: 50,
            retry: RetryPolicy::default(),
        }
    }
}

impl DeliberationConfig {
    // ==================== Builder Methods ====================

    pub fn with_target_participants(mut self, target: usize) -> Self {
        self.target_participants = target;
        self
    }

    pub fn with_quorum(mut self, quorum: QuorumRule) -> Self {
        self.quorum = quorum;
        self
    }

    pub fn with_rounds(mut self, min_rounds: u32, max_rounds: u32) -> Self {
        self.min_rounds = min_rounds;
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_participant_timeout(mut self, timeout: Duration) -> Self {
        self.participant_timeout = timeout;
        self
    }

    pub fn with_convergence_epsilon(mut self, epsilon: f64) -> Self {
        self.convergence_epsilon = epsilon;
        self
    }

    pub fn with_emergence(mut self, emergence: EmergenceConfig) -> Self {
        self.emergence = emergence;
        self
    }

    pub fn with_resonance(mut self, resonance: ResonanceSettings) -> Self {
        self.resonance = resonance;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Minimum number of active participants
    pub fn required_quorum(&self) -> usize {
        self.quorum.required(self.target_participants)
    }

    // ==================== Validation ====================

    /// Collect every problem with this configuration
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.target_participants == 0 {
            issues.push(out_of_range(
                "deliberation.target_participants",
                "target_participants must be at least 1",
            ));
        }
        if self.required_quorum() > self.target_participants {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::Inconsistent {
                    fields: vec![
                        "deliberation.quorum".to_string(),
                        "deliberation.target_participants".to_string(),
                    ],
                },
                format!(
                    "quorum {} needs {} participants but the target is {}",
                    self.quorum,
                    self.required_quorum(),
                    self.target_participants
                ),
            ));
        }
        if self.max_rounds == 0 {
            issues.push(out_of_range(
                "deliberation.max_rounds",
                "max_rounds must be at least 1",
            ));
        }
        if self.min_rounds > self.max_rounds {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::Inconsistent {
                    fields: vec![
                        "deliberation.min_rounds".to_string(),
                        "deliberation.max_rounds".to_string(),
                    ],
                },
                format!(
                    "min_rounds ({}) exceeds max_rounds ({})",
                    self.min_rounds, self.max_rounds
                ),
            ));
        }
        if self.participant_timeout.is_zero() {
            issues.push(out_of_range(
                "deliberation.participant_timeout_secs",
                "participant timeout must be positive",
            ));
        }
        if !(self.convergence_epsilon >= 0.0) {
            issues.push(out_of_range(
                "deliberation.convergence_epsilon",
                "convergence_epsilon must be non-negative",
            ));
        }

        // Emergence
        if !unit_interval(self.emergence.threshold) {
            issues.push(out_of_range(
                "emergence.threshold",
                "emergence threshold must be within [0, 1]",
            ));
        }
        for problem in self.emergence.vocabulary.problems() {
            issues.push(ConfigIssue::error(ConfigIssueCode::InvalidVocabulary, problem));
        }

        // Resonance
        let policy = &self.resonance.policy;
        for (field, value) in [
            ("resonance.speaking_threshold", policy.speaking_threshold),
            ("resonance.sacred_cap", policy.sacred_cap),
            ("resonance.alignment_cap", policy.alignment_cap),
            ("resonance.pattern_cap", policy.pattern_cap),
            ("resonance.temporal_cap", policy.temporal_cap),
        ] {
            if !unit_interval(value) {
                issues.push(out_of_range(
                    field,
                    format!("{} must be within [0, 1], got {}", field, value),
                ));
            }
        }
        if !(policy.half_life_days > 0.0) {
            issues.push(out_of_range(
                "resonance.half_life_days",
                "half_life_days must be positive",
            ));
        }
        if policy.max_attainable() < policy.speaking_threshold {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::MemoryCannotSpeak,
                format!(
                    "resonance caps sum to {:.2}, below the speaking threshold {:.2}; memories will never speak",
                    policy.max_attainable(),
                    policy.speaking_threshold
                ),
            ));
        }
        if self.resonance.cache_capacity == 0 {
            issues.push(out_of_range(
                "resonance.cache_capacity",
                "cache_capacity must be at least 1",
            ));
        }

        // Health and retries
        if self.health_window == 0 {
            issues.push(out_of_range("health.window", "health window must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            issues.push(out_of_range(
                "persistence.max_attempts",
                "max_attempts must be at least 1",
            ));
        }

        issues
    }
}

fn unit_interval(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

fn out_of_range(field: &str, message: impl Into<String>) -> ConfigIssue {
    ConfigIssue::error(
        ConfigIssueCode::OutOfRange {
            field: field.to_string(),
        },
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::config::{Severity, has_errors};
    use council_domain::IndicatorVocabulary;

    #[test]
    fn test_default_is_valid() {
        let config = DeliberationConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.required_quorum(), 3);
    }

    #[test]
    fn test_round_limits() {
        let config = DeliberationConfig::default().with_rounds(4, 3);
        let issues = config.validate();
        assert!(has_errors(&issues));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::Inconsistent { fields } if fields.contains(&"deliberation.min_rounds".to_string())
        )));
    }

    #[test]
    fn test_unreachable_speaking_threshold_is_warning() {
        let mut config = DeliberationConfig::default();
        config.resonance.policy.sacred_cap = 0.1;
        config.resonance.policy.temporal_cap = 0.1;

        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert_eq!(issues[0].code, ConfigIssueCode::MemoryCannotSpeak);
    }

    #[test]
    fn test_out_of_range_values() {
        let mut config = DeliberationConfig::default();
        config.resonance.policy.speaking_threshold = 1.5;
        config.emergence.threshold = -0.1;
        config.retry.max_attempts = 0;

        let issues = config.validate();
        let fields: Vec<String> = issues
            .iter()
            .filter_map(|i| match &i.code {
                ConfigIssueCode::OutOfRange { field } => Some(field.clone()),
                _ => None,
            })
            .collect();
        assert!(fields.contains(&"resonance.speaking_threshold".to_string()));
        assert!(fields.contains(&"emergence.threshold".to_string()));
        assert!(fields.contains(&"persistence.max_attempts".to_string()));
    }

    #[test]
    fn test_empty_vocabulary() {
        let mut config = DeliberationConfig::default();
        config.emergence.vocabulary = IndicatorVocabulary::new(Vec::new());
        assert!(
            config
                .validate()
                .iter()
                .any(|i| i.code == ConfigIssueCode::InvalidVocabulary)
        );
    }

    #[test]
    fn test_quorum_larger_than_target() {
        let config = DeliberationConfig::default()
            .with_target_participants(3)
            .with_quorum(QuorumRule::AtLeast(4));
        assert!(has_errors(&config.validate()));
    }
}
