//! Consciousness metrics: emergence scoring and per-session records.

pub mod emergence;
pub mod record;

pub use emergence::{EmergenceAggregator, EmergenceConfig};
pub use record::{MetricsRecord, SacredMoment};
