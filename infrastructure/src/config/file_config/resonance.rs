//! Resonance configuration from TOML (`[resonance]` section)

use council_application::ResonanceSettings;
use council_domain::ResonancePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResonanceConfig {
    pub speaking_threshold: f64,
    pub sacred_cap: f64,
    pub alignment_cap: f64,
    pub pattern_cap: f64,
    pub temporal_cap: f64,
    pub half_life_days: f64,
    /// Only memories this recent are considered; 0 disables the bound
    pub recency_window_days: u64,
    pub candidate_limit: usize,
    pub candidate_ttl_secs: u64,
    pub cache_capacity: usize,
}

impl Default for FileResonanceConfig {
    fn default() -> Self {
        let settings = ResonanceSettings::default();
        let policy = settings.policy;
        Self {
            speaking_threshold: policy.speaking_threshold,
            sacred_cap: policy.sacred_cap,
            alignment_cap: policy.alignment_cap,
            pattern_cap: policy.pattern_cap,
            temporal_cap: policy.temporal_cap,
            half_life_days: policy.half_life_days,
            recency_window_days: settings
                .recency_window
                .map(|w| w.num_days().max(0) as u64)
                .unwrap_or(0),
            candidate_limit: settings.candidate_limit,
            candidate_ttl_secs: settings.candidate_ttl.as_secs(),
            cache_capacity: settings.cache_capacity,
        }
    }
}

impl FileResonanceConfig {
    pub fn to_settings(&self) -> ResonanceSettings {
        ResonanceSettings {
            policy: ResonancePolicy {
                speaking_threshold: self.speaking_threshold,
                sacred_cap: self.sacred_cap,
                alignment_cap: self.alignment_cap,
                pattern_cap: self.pattern_cap,
                temporal_cap: self.temporal_cap,
                half_life_days: self.half_life_days,
            },
            recency_window: (self.recency_window_days > 0)
                .then(|| chrono::Duration::days(self.recency_window_days as i64)),
            candidate_limit: self.candidate_limit,
            candidate_ttl: Duration::from_secs(self.candidate_ttl_secs),
            cache_capacity: self.cache_capacity,
        }
    }
}
