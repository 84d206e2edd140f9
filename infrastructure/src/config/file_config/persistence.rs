//! Persistence configuration from TOML (`[persistence]` and `[health]`)

use council_application::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePersistenceConfig {
    /// Store directory; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// Gateway read cache size
    pub cache_capacity: usize,
}

impl Default for FilePersistenceConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            data_dir: None,
            max_attempts: retry.max_attempts,
            initial_backoff_ms: retry.initial_backoff.as_millis() as u64,
            max_backoff_ms: retry.max_backoff.as_millis() as u64,
            cache_capacity: 128,
        }
    }
}

impl FilePersistenceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_backoff(
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
    }

    /// Configured directory, else `$XDG_DATA_HOME/council`, else `./.council`
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("council")))
            .unwrap_or_else(|| PathBuf::from(".council"))
    }
}

/// Participant health tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHealthConfig {
    /// Outcomes remembered per participant
    pub window: usize,
}

impl Default for FileHealthConfig {
    fn default() -> Self {
        Self { window: 50 }
    }
}
