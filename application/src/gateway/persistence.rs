//! Persistence gateway implementation
//!
//! | Operation        | Write rule                         | Failure     |
//! |------------------|------------------------------------|-------------|
//! | `save_session`   | stored version == session version  | `Conflict`  |
//! | `save_metrics`   | key absent (append-only)           | `Duplicate` |
//! | `save_memory`    | key absent (append-only)           | `Duplicate` |
//! | `promote_sacred` | compare-and-set on the memory      | `NotFound`  |
//!
//! Archived sessions and metrics records never change once written, so they
//! are kept in small LRU read caches. Memory records are always read through
//! because their sacred flag can still flip.

use super::error::PersistenceError;
use crate::ports::durable_store::{
    Collection, DocumentFilter, DocumentWrite, DurableStore, VersionedDocument, WriteExpectation,
};
use council_domain::{
    EpisodicMemoryRecord, MemoryId, MetricsRecord, Session, SessionId, SessionState, TimeWindow,
};
use lru::LruCache;
use serde::de::DeserializeOwned;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_CACHE_CAPACITY: usize = 128;

/// Upper bound on compare-and-set rounds in `promote_sacred`
const MAX_PROMOTE_ATTEMPTS: usize = 8;

/// Sole access point to durable storage
pub struct PersistenceGateway {
    store: Box<dyn DurableStore>,
    archived_sessions: Mutex<LruCache<SessionId, Session>>,
    metrics: Mutex<LruCache<SessionId, MetricsRecord>>,
}

impl PersistenceGateway {
    /// Take ownership of `store`
    pub fn new(store: Box<dyn DurableStore>) -> Self {
        Self::with_cache_capacity(store, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(store: Box<dyn DurableStore>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            archived_sessions: Mutex::new(LruCache::new(capacity)),
            metrics: Mutex::new(LruCache::new(capacity)),
        }
    }

    // ==================== Sessions ====================

    /// Versioned write of the full session.
    ///
    /// Succeeds only if the stored version still equals `session.version()`.
    /// Returns the new version; the caller records it with
    /// [`Session::set_version`].
    pub async fn save_session(&self, session: &Session) -> Result<u64, PersistenceError> {
        let write = DocumentWrite {
            body: serde_json::to_value(session)?,
            domain: Some(session.domain().to_string()),
            timestamp: session.created_at(),
        };
        let version = self
            .store
            .put(
                Collection::Sessions,
                session.id().as_str(),
                write,
                WriteExpectation::Version(session.version()),
            )
            .await?;

        debug!(
            "Saved session {} ({}) at version {}",
            session.id(),
            session.state(),
            version
        );

        if session.state() == SessionState::Archived {
            let mut stored = session.clone();
            stored.set_version(version);
            cache_put(&self.archived_sessions, session.id().clone(), stored);
        }
        Ok(version)
    }

    /// Load a session with its storage version set
    pub async fn load_session(&self, id: &SessionId) -> Result<Session, PersistenceError> {
        if let Some(session) = cache_get(&self.archived_sessions, id) {
            return Ok(session);
        }

        let document = self.fetch(Collection::Sessions, id.as_str()).await?;
        let mut session: Session = decode(&document)?;
        session.set_version(document.version);

        if session.state() == SessionState::Archived {
            cache_put(&self.archived_sessions, id.clone(), session.clone());
        }
        Ok(session)
    }

    // ==================== Metrics ====================

    /// Append-only insert, one record per session
    pub async fn save_metrics(&self, record: &MetricsRecord) -> Result<(), PersistenceError> {
        let write = DocumentWrite {
            body: serde_json::to_value(record)?,
            domain: Some(record.domain.clone()),
            timestamp: record.concluded_at,
        };
        self.store
            .put(
                Collection::Metrics,
                record.session_id.as_str(),
                write,
                WriteExpectation::Absent,
            )
            .await?;
        cache_put(&self.metrics, record.session_id.clone(), record.clone());
        Ok(())
    }

    pub async fn load_metrics(&self, session_id: &SessionId) -> Result<MetricsRecord, PersistenceError> {
        if let Some(record) = cache_get(&self.metrics, session_id) {
            return Ok(record);
        }
        let document = self.fetch(Collection::Metrics, session_id.as_str()).await?;
        let record: MetricsRecord = decode(&document)?;
        cache_put(&self.metrics, session_id.clone(), record.clone());
        Ok(record)
    }

    // ==================== Memories ====================

    /// Append-only insert of a new memory record
    pub async fn save_memory(&self, record: &EpisodicMemoryRecord) -> Result<(), PersistenceError> {
        let write = memory_write(record)?;
        self.store
            .put(
                Collection::Memories,
                record.id.as_str(),
                write,
                WriteExpectation::Absent,
            )
            .await?;
        Ok(())
    }

    pub async fn get_memory(&self, id: &MemoryId) -> Result<EpisodicMemoryRecord, PersistenceError> {
        let document = self.fetch(Collection::Memories, id.as_str()).await?;
        decode(&document)
    }

    /// Memory records of `domain` created within `window`, newest first
    pub async fn query_memories(
        &self,
        domain: &str,
        window: TimeWindow,
        limit: Option<usize>,
    ) -> Result<Vec<EpisodicMemoryRecord>, PersistenceError> {
        let filter = DocumentFilter {
            domain: Some(domain.to_string()),
            window,
            limit,
        };
        let documents = self.store.query(Collection::Memories, &filter).await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in &documents {
            match decode::<EpisodicMemoryRecord>(document) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping unreadable memory {}: {}", document.key, e),
            }
        }
        Ok(records)
    }

    /// Set the sacred flag of a memory. Idempotent.
    ///
    /// Concurrent writers are resolved with a compare-and-set loop; the
    /// loop gives up with `Conflict` after a bounded number of rounds.
    pub async fn promote_sacred(&self, id: &MemoryId) -> Result<EpisodicMemoryRecord, PersistenceError> {
        let mut last_conflict = None;

        for _ in 0..MAX_PROMOTE_ATTEMPTS {
            let document = self.fetch(Collection::Memories, id.as_str()).await?;
            let mut record: EpisodicMemoryRecord = decode(&document)?;
            if !record.mark_sacred() {
                return Ok(record);
            }

            let result = self
                .store
                .put(
                    Collection::Memories,
                    id.as_str(),
                    memory_write(&record)?,
                    WriteExpectation::Version(document.version),
                )
                .await
                .map_err(PersistenceError::from);

            match result {
                Ok(_) => {
                    debug!("Promoted memory {} to sacred", id);
                    return Ok(record);
                }
                Err(e @ PersistenceError::Conflict { .. }) => {
                    debug!("Concurrent update on memory {}, retrying", id);
                    last_conflict = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_conflict.unwrap_or_else(|| PersistenceError::NotFound(id.to_string())))
    }

    // ==================== Helpers ====================

    async fn fetch(&self, collection: Collection, key: &str) -> Result<VersionedDocument, PersistenceError> {
        self.store
            .get(collection, key)
            .await?
            .ok_or_else(|| PersistenceError::NotFound(format!("{}/{}", collection, key)))
    }
}

fn memory_write(record: &EpisodicMemoryRecord) -> Result<DocumentWrite, PersistenceError> {
    Ok(DocumentWrite {
        body: serde_json::to_value(record)?,
        domain: Some(record.domain.clone()),
        timestamp: record.created_at,
    })
}

fn decode<T: DeserializeOwned>(document: &VersionedDocument) -> Result<T, PersistenceError> {
    Ok(serde_json::from_value(document.body.clone())?)
}

// Caches fail open: a poisoned lock only costs a store round trip.

fn cache_get<V: Clone>(cache: &Mutex<LruCache<SessionId, V>>, key: &SessionId) -> Option<V> {
    cache.lock().ok()?.get(key).cloned()
}

fn cache_put<V>(cache: &Mutex<LruCache<SessionId, V>>, key: SessionId, value: V) {
    if let Ok(mut cache) = cache.lock() {
        cache.put(key, value);
    }
}
