//! Participant health tracking shared across sessions.

pub mod tracker;

pub use tracker::HealthTracker;
