//! Deliberation configuration from TOML (`[deliberation]` section)
//!
//! ```toml
//! [deliberation]
//! target_participants = 5
//! quorum = "majority"          # or "unanimous", "atleast:3", "60%"
//! min_rounds = 2
//! max_rounds = 5
//! participant_timeout_secs = 60
//! convergence_epsilon = 0.01
//! transcript_context = 10
//! ```

use council_application::DeliberationConfig;
use council_domain::{ConfigIssue, ConfigIssueCode, QuorumRule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDeliberationConfig {
    pub target_participants: usize,
    /// Quorum rule: "majority", "unanimous", "atleast:N", "N%"
    pub quorum: String,
    pub min_rounds: u32,
    pub max_rounds: u32,
    pub participant_timeout_secs: u64,
    pub convergence_epsilon: f64,
    /// Messages of recent transcript included in each prompt
    pub transcript_context: usize,
}

impl Default for FileDeliberationConfig {
    fn default() -> Self {
        let defaults = DeliberationConfig::default();
        Self {
            target_participants: defaults.target_participants,
            quorum: quorum_key(defaults.quorum),
            min_rounds: defaults.min_rounds,
            max_rounds: defaults.max_rounds,
            participant_timeout_secs: defaults.participant_timeout.as_secs(),
            convergence_epsilon: defaults.convergence_epsilon,
            transcript_context: defaults.transcript_context,
        }
    }
}

impl FileDeliberationConfig {
    /// Parse the quorum string, falling back to majority on error
    pub fn parse_quorum(&self) -> (QuorumRule, Vec<ConfigIssue>) {
        match self.quorum.parse::<QuorumRule>() {
            Ok(rule) => (rule, vec![]),
            Err(e) => (
                QuorumRule::default(),
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidValue {
                        field: "deliberation.quorum".to_string(),
                        value: self.quorum.clone(),
                    },
                    format!("deliberation.quorum: {}", e),
                )],
            ),
        }
    }
}

/// The string form `QuorumRule::from_str` accepts
fn quorum_key(rule: QuorumRule) -> String {
    match rule {
        QuorumRule::Majority => "majority".to_string(),
        QuorumRule::Unanimous => "unanimous".to_string(),
        QuorumRule::AtLeast(n) => format!("atleast:{}", n),
        QuorumRule::Percentage(p) => format!("{}%", p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_application_defaults() {
        let config = FileDeliberationConfig::default();
        assert_eq!(config.target_participants, 5);
        assert_eq!(config.quorum, "majority");
        assert_eq!(config.participant_timeout_secs, 60);
        let (rule, issues) = config.parse_quorum();
        assert_eq!(rule, QuorumRule::Majority);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_parse_quorum_variants() {
        let mut config = FileDeliberationConfig::default();
        for (raw, expected) in [
            ("unanimous", QuorumRule::Unanimous),
            ("atleast:3", QuorumRule::AtLeast(3)),
            ("60%", QuorumRule::Percentage(60)),
        ] {
            config.quorum = raw.to_string();
            assert_eq!(config.parse_quorum().0, expected);
            assert_eq!(quorum_key(expected), raw);
        }
    }

    #[test]
    fn test_invalid_quorum_is_reported() {
        let config = FileDeliberationConfig {
            quorum: "most".to_string(),
            ..Default::default()
        };
        let (rule, issues) = config.parse_quorum();
        assert_eq!(rule, QuorumRule::Majority);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }
}
