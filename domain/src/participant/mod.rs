//! Participants and their health.
//!
//! - [`Participant`] — identity and capabilities of one provider configuration
//! - [`ParticipantResponse`] — the normalized adapter response contract
//! - [`HealthRecord`] — trailing-window outcome history used for selection

pub mod entities;
pub mod health;
pub mod response;

pub use entities::Participant;
pub use health::{HealthRecord, HealthSnapshot, OutcomeCounts, OutcomeEvent};
pub use response::{ParticipantResponse, ResponseClassification};
