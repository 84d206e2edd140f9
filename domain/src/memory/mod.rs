//! Episodic memory and resonance scoring.

pub mod record;
pub mod resonance;

pub use record::{EpisodicMemoryRecord, TimeWindow};
pub use resonance::{ResonanceBreakdown, ResonanceCandidate, ResonancePolicy};
