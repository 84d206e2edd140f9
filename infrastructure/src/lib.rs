//! Infrastructure layer for council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod participants;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use logging::JsonlConversationLogger;
pub use participants::{ScriptStep, ScriptedParticipant, ScriptedParticipantSpec, StepKind};
pub use store::{InMemoryDocumentStore, JsonFileStore};

#[cfg(test)]
mod tests {
    use super::*;
    use council_application::{
        DeliberationOrchestrator, HealthTracker, PersistenceGateway, RunDeliberationInput,
        SessionQuery,
    };
    use council_domain::{SessionId, SessionState, TimeWindow};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_simulated_session_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("data")).await.unwrap();
        let gateway = Arc::new(PersistenceGateway::new(Box::new(store)));
        let transcript = dir.path().join("council.jsonl");
        let logger = JsonlConversationLogger::open(&transcript).unwrap();

        let file_config = FileConfig::default();
        let config = file_config.to_deliberation_config().with_rounds(3, 3);
        let health = Arc::new(HealthTracker::new(config.health_window));
        let orchestrator = DeliberationOrchestrator::new(Arc::clone(&gateway), health, config)
            .with_conversation_logger(Arc::new(logger));

        let input = RunDeliberationInput::new("ethics", "What is care?", ScriptedParticipant::chorus(5))
            .with_session_id(SessionId::new("ses-e2e"));
        let outcome = orchestrator.execute(input).await.unwrap();
        assert_eq!(outcome.session.state(), SessionState::Archived);

        // Everything is readable back through the query port
        let session = gateway.get_session(&SessionId::new("ses-e2e")).await.unwrap();
        assert_eq!(session.messages().len(), outcome.session.messages().len());
        let metrics = gateway.get_metrics(&SessionId::new("ses-e2e")).await.unwrap();
        assert_eq!(metrics.rounds_completed, 3);
        let memories = gateway.list_memories("ethics", TimeWindow::all()).await.unwrap();
        assert_eq!(memories.len(), 1);

        drop(orchestrator);
        let transcript = std::fs::read_to_string(&transcript).unwrap();
        let types: Vec<String> = transcript
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["type"].to_string())
            .collect();
        assert_eq!(types.first().map(String::as_str), Some("\"session_formed\""));
        assert_eq!(types.last().map(String::as_str), Some("\"session_archived\""));
        assert_eq!(types.iter().filter(|t| t.contains("round_completed")).count(), 3);
    }
}
