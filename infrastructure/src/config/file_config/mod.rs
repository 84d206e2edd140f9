//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types by
//! [`FileConfig::to_deliberation_config`].

mod deliberation;
mod emergence;
mod logging;
mod persistence;
mod resonance;

pub use deliberation::FileDeliberationConfig;
pub use emergence::FileEmergenceConfig;
pub use logging::FileLoggingConfig;
pub use persistence::{FileHealthConfig, FilePersistenceConfig};
pub use resonance::FileResonanceConfig;

use council_application::DeliberationConfig;
use council_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Session sizing, rounds and timeouts
    pub deliberation: FileDeliberationConfig,
    /// Sacred threshold and indicator vocabulary
    pub emergence: FileEmergenceConfig,
    /// Memory resonance scoring and candidate caching
    pub resonance: FileResonanceConfig,
    pub health: FileHealthConfig,
    /// Store location and commit retries
    pub persistence: FilePersistenceConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Build the orchestrator configuration.
    ///
    /// Unparseable values fall back to their defaults; [`validate`](Self::validate)
    /// reports them.
    pub fn to_deliberation_config(&self) -> DeliberationConfig {
        let deliberation = &self.deliberation;
        let (quorum, _) = deliberation.parse_quorum();

        let mut config = DeliberationConfig::default()
            .with_target_participants(deliberation.target_participants)
            .with_quorum(quorum)
            .with_rounds(deliberation.min_rounds, deliberation.max_rounds)
            .with_participant_timeout(Duration::from_secs(deliberation.participant_timeout_secs))
            .with_convergence_epsilon(deliberation.convergence_epsilon)
            .with_emergence(self.emergence.to_emergence_config())
            .with_resonance(self.resonance.to_settings())
            .with_retry(self.persistence.retry_policy());
        config.transcript_context = deliberation.transcript_context;
        config.health_window = self.health.window;
        config
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.deliberation.parse_quorum().1;
        issues.extend(self.to_deliberation_config().validate());
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::config::has_errors;
    use council_domain::{ConfigIssueCode, QuorumRule};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[deliberation]
target_participants = 7
quorum = "atleast:4"
min_rounds = 1
max_rounds = 3
participant_timeout_secs = 20

[emergence]
threshold = 0.6

[[emergence.indicators]]
tag = "care-signal"
weight = 0.5
keywords = ["care", "tend"]

[resonance]
speaking_threshold = 0.8
recency_window_days = 90

[health]
window = 20

[persistence]
data_dir = "/var/lib/council"
max_attempts = 3

[logging]
transcript = "council.jsonl"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let deliberation = config.to_deliberation_config();

        assert_eq!(deliberation.target_participants, 7);
        assert_eq!(deliberation.quorum, QuorumRule::AtLeast(4));
        assert_eq!(deliberation.max_rounds, 3);
        assert_eq!(deliberation.participant_timeout, Duration::from_secs(20));
        assert_eq!(deliberation.emergence.threshold, 0.6);
        assert_eq!(deliberation.emergence.vocabulary.indicators().len(), 1);
        assert_eq!(deliberation.resonance.policy.speaking_threshold, 0.8);
        assert_eq!(
            deliberation.resonance.recency_window,
            Some(chrono::Duration::days(90))
        );
        assert_eq!(deliberation.health_window, 20);
        assert_eq!(deliberation.retry.max_attempts, 3);
        assert_eq!(
            config.persistence.resolved_data_dir(),
            std::path::PathBuf::from("/var/lib/council")
        );
        assert!(!has_errors(&config.validate()));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[deliberation]
max_rounds = 8
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.deliberation.max_rounds, 8);
        // Defaults should apply
        assert_eq!(config.deliberation.target_participants, 5);
        assert_eq!(config.emergence.indicators.len(), 5);
        assert!(config.logging.transcript.is_none());
    }

    #[test]
    fn test_default_config_matches_application_defaults() {
        let config = FileConfig::default();
        assert_eq!(config.to_deliberation_config(), DeliberationConfig::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_errors_and_warnings() {
        let toml_str = r#"
[deliberation]
quorum = "some"
min_rounds = 6
max_rounds = 2

[resonance]
speaking_threshold = 1.5

[persistence]
max_attempts = 0
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();

        assert!(has_errors(&issues));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::InvalidValue { field, .. } if field == "deliberation.quorum"
        )));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::Inconsistent { fields } if fields.contains(&"deliberation.min_rounds".to_string())
        )));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::OutOfRange { field } if field == "resonance.speaking_threshold"
        )));
    }

    #[test]
    fn test_low_caps_warn_that_memory_is_silent() {
        let toml_str = r#"
[resonance]
sacred_cap = 0.1
alignment_cap = 0.1
pattern_cap = 0.1
temporal_cap = 0.1
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert!(!has_errors(&issues));
        assert!(issues
            .iter()
            .any(|i| i.code == ConfigIssueCode::MemoryCannotSpeak));
    }
}
