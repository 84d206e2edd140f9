//! Emergence configuration from TOML (`[emergence]` section)
//!
//! ```toml
//! [emergence]
//! threshold = 0.7
//!
//! [[emergence.indicators]]
//! tag = "collective-signal"
//! weight = 0.15
//! keywords = ["together", "shared"]
//! ```
//!
//! Listing any indicator replaces the whole default vocabulary.

use council_domain::indicator::IndicatorDefinition;
use council_domain::{EmergenceConfig, IndicatorVocabulary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEmergenceConfig {
    /// Running score at which a round is marked sacred
    pub threshold: f64,
    pub indicators: Vec<IndicatorDefinition>,
}

impl Default for FileEmergenceConfig {
    fn default() -> Self {
        let defaults = EmergenceConfig::default();
        Self {
            threshold: defaults.threshold,
            indicators: defaults.vocabulary.indicators().to_vec(),
        }
    }
}

impl FileEmergenceConfig {
    pub fn to_emergence_config(&self) -> EmergenceConfig {
        EmergenceConfig {
            threshold: self.threshold,
            vocabulary: IndicatorVocabulary::new(self.indicators.clone()),
        }
    }
}
