//! Participant adapters
//!
//! Provider-specific clients live outside this crate; what ships here is a
//! scripted participant for simulations and end-to-end tests.

mod scripted;

pub use scripted::{ScriptStep, ScriptedParticipant, ScriptedParticipantSpec, StepKind};
