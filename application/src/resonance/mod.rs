//! Memory resonance: letting past sessions speak into live dialogue.

pub mod engine;

pub use engine::{DialogueSnapshot, MemoryResonanceEngine, ResonantMemory};
