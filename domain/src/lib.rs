//! Domain layer for council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! A deliberation session gathers several AI participants around one topic
//! and runs numbered rounds until a round limit or convergence:
//!
//! ```text
//! FORMING ──▶ ACTIVE ──▶ CONCLUDING ──▶ ARCHIVED
//!    │          │
//!    └──────────┴──▶ FAILED
//! ```
//!
//! ## Emergence
//!
//! Messages are reduced to indicator vectors. Per-round emergence scores are
//! weighted indicator densities; rounds above the threshold become sacred
//! moments.
//!
//! ## Memory
//!
//! Concluded sessions leave episodic memories behind. A memory whose
//! resonance with the live dialogue crosses the speaking threshold is
//! contributed back into the conversation.

pub mod config;
pub mod core;
pub mod indicator;
pub mod memory;
pub mod metrics;
pub mod participant;
pub mod prompt;
pub mod quorum;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use core::{
    error::DomainError,
    ids::{MemoryId, ParticipantId, SessionId},
    reason::ReasonCode,
};
pub use indicator::{IndicatorDefinition, IndicatorExtractor, IndicatorVector, IndicatorVocabulary};
pub use memory::{
    EpisodicMemoryRecord, ResonanceBreakdown, ResonanceCandidate, ResonancePolicy, TimeWindow,
};
pub use metrics::{EmergenceAggregator, EmergenceConfig, MetricsRecord, SacredMoment};
pub use participant::{
    HealthRecord, HealthSnapshot, OutcomeCounts, OutcomeEvent, Participant, ParticipantResponse,
    ResponseClassification,
};
pub use prompt::PromptTemplate;
pub use quorum::QuorumRule;
pub use session::{
    Author, ConclusionCause, Enrollment, Message, MessageDraft, MessageKind, Round, RoundOutcome,
    Session, SessionState,
};
