//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of conversation events
    pub transcript: Option<PathBuf>,
    /// Daily-rolling log file; stderr only when unset
    pub file: Option<PathBuf>,
}
