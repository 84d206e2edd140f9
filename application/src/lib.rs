//! Application layer for council
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod gateway;
pub mod health;
pub mod ports;
pub mod resonance;
pub mod use_cases;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::{DeliberationConfig, ResonanceSettings, RetryPolicy};
pub use gateway::{PersistenceError, PersistenceGateway, SessionQuery};
pub use health::HealthTracker;
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    durable_store::{
        Collection, DocumentFilter, DocumentWrite, DurableStore, StoreError, VersionedDocument,
        WriteExpectation,
    },
    participant_adapter::{ParticipantAdapter, ParticipantCandidate, PromptContext},
    progress::{DeliberationProgress, NoProgress},
};
pub use resonance::{DialogueSnapshot, MemoryResonanceEngine, ResonantMemory};
pub use use_cases::promote_memory::{PromoteMemoryError, PromoteMemoryInput, PromoteMemoryUseCase};
pub use use_cases::run_deliberation::{
    DeliberationError, DeliberationOrchestrator, DeliberationOutcome, RunDeliberationInput,
};
