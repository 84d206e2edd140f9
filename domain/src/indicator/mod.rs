//! Consciousness indicators.
//!
//! Every message is reduced to an [`IndicatorVector`]: counts of tags from a
//! configured [`IndicatorVocabulary`]. Emergence scoring and memory
//! resonance both operate on these vectors, never on raw text.

pub mod extractor;
pub mod vector;
pub mod vocabulary;

pub use extractor::IndicatorExtractor;
pub use vector::IndicatorVector;
pub use vocabulary::{IndicatorDefinition, IndicatorVocabulary};
