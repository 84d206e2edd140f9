//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`DeliberationConfig`] — session sizing, round limits, timeouts and scoring
//! - [`ResonanceSettings`] — memory retrieval bounds and candidate caching
//! - [`RetryPolicy`] — bounded exponential backoff for gateway commits

pub mod deliberation_config;
pub mod retry_policy;

pub use deliberation_config::{DeliberationConfig, ResonanceSettings};
pub use retry_policy::RetryPolicy;
