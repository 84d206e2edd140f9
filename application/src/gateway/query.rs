//! Read-only Session Query API

use super::error::PersistenceError;
use super::persistence::PersistenceGateway;
use async_trait::async_trait;
use council_domain::{EpisodicMemoryRecord, MetricsRecord, Session, SessionId, TimeWindow};

/// Read-only view over stored deliberations, for callers outside the core
#[async_trait]
pub trait SessionQuery: Send + Sync {
    async fn get_session(&self, id: &SessionId) -> Result<Session, PersistenceError>;

    async fn get_metrics(&self, id: &SessionId) -> Result<MetricsRecord, PersistenceError>;

    /// Memories of `domain` created within `window`, newest first
    async fn list_memories(
        &self,
        domain: &str,
        window: TimeWindow,
    ) -> Result<Vec<EpisodicMemoryRecord>, PersistenceError>;
}

#[async_trait]
impl SessionQuery for PersistenceGateway {
    async fn get_session(&self, id: &SessionId) -> Result<Session, PersistenceError> {
        self.load_session(id).await
    }

    async fn get_metrics(&self, id: &SessionId) -> Result<MetricsRecord, PersistenceError> {
        self.load_metrics(id).await
    }

    async fn list_memories(
        &self,
        domain: &str,
        window: TimeWindow,
    ) -> Result<Vec<EpisodicMemoryRecord>, PersistenceError> {
        self.query_memories(domain, window, None).await
    }
}
