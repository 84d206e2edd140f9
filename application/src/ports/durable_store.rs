//! Durable store port
//!
//! A versioned document store with range/filter queries. Only the
//! [`PersistenceGateway`](crate::gateway::PersistenceGateway) holds an
//! instance; nothing else in the core is handed one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use council_domain::TimeWindow;
use serde_json::Value;
use std::cmp::Reverse;
use thiserror::Error;

/// Errors reported by a store implementation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Version mismatch for {key}: expected {expected}, found {actual}")]
    VersionMismatch { key: String, expected: u64, actual: u64 },

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether retrying the same operation later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Document collections used by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Sessions,
    Metrics,
    Memories,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Sessions => "sessions",
            Collection::Metrics => "metrics",
            Collection::Memories => "memories",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precondition for a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteExpectation {
    /// The key must not exist yet
    Absent,
    /// The stored version must equal this value (0 = not stored yet)
    Version(u64),
    /// Unconditional overwrite
    Any,
}

/// A document to be written, with the metadata queries filter on
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    pub body: Value,
    pub domain: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedDocument {
    pub key: String,
    /// Starts at 1 and increases by one on every successful write
    pub version: u64,
    pub body: Value,
    pub domain: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Query filter: domain tag, time window and result limit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub domain: Option<String>,
    pub window: TimeWindow,
    pub limit: Option<usize>,
}

impl DocumentFilter {
    pub fn matches(&self, document: &VersionedDocument) -> bool {
        let domain_ok = self
            .domain
            .as_deref()
            .is_none_or(|d| document.domain.as_deref() == Some(d));
        domain_ok && self.window.contains(document.timestamp)
    }

    /// Filter, order newest first (key order breaks ties) and truncate
    pub fn select<I>(&self, documents: I) -> Vec<VersionedDocument>
    where
        I: IntoIterator<Item = VersionedDocument>,
    {
        let mut selected: Vec<VersionedDocument> =
            documents.into_iter().filter(|d| self.matches(d)).collect();
        selected.sort_by(|a, b| {
            Reverse(a.timestamp)
                .cmp(&Reverse(b.timestamp))
                .then_with(|| a.key.cmp(&b.key))
        });
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

/// Versioned document storage
#[async_trait]
pub trait DurableStore: Send + Sync {
    async fn get(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<VersionedDocument>, StoreError>;

    /// Write a document if `expectation` holds; returns the new version
    async fn put(
        &self,
        collection: Collection,
        key: &str,
        document: DocumentWrite,
        expectation: WriteExpectation,
    ) -> Result<u64, StoreError>;

    /// Matching documents, newest first
    async fn query(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<VersionedDocument>, StoreError>;
}

/// Check `expectation` against the currently stored version (0 = absent).
///
/// Shared by store implementations so they agree on precondition semantics.
pub fn check_expectation(
    key: &str,
    current: u64,
    expectation: WriteExpectation,
) -> Result<(), StoreError> {
    match expectation {
        WriteExpectation::Any => Ok(()),
        WriteExpectation::Absent if current == 0 => Ok(()),
        WriteExpectation::Absent => Err(StoreError::AlreadyExists(key.to_string())),
        WriteExpectation::Version(expected) if expected == current => Ok(()),
        WriteExpectation::Version(expected) => Err(StoreError::VersionMismatch {
            key: key.to_string(),
            expected,
            actual: current,
        }),
    }
}
