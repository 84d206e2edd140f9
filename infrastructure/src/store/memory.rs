//! In-process document store.

use async_trait::async_trait;
use council_application::ports::durable_store::check_expectation;
use council_application::{
    Collection, DocumentFilter, DocumentWrite, DurableStore, StoreError, VersionedDocument,
    WriteExpectation,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

type Key = (Collection, String);

/// Versioned document store backed by a `HashMap`.
///
/// Nothing survives the process; useful for `council simulate` and tests.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<Key, VersionedDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`
    pub async fn len(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }
}

#[async_trait]
impl DurableStore for InMemoryDocumentStore {
    async fn get(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<VersionedDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.get(&(collection, key.to_string())).cloned())
    }

    async fn put(
        &self,
        collection: Collection,
        key: &str,
        document: DocumentWrite,
        expectation: WriteExpectation,
    ) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let entry_key = (collection, key.to_string());
        let current = documents.get(&entry_key).map(|d| d.version).unwrap_or(0);
        check_expectation(key, current, expectation)?;

        let version = current + 1;
        documents.insert(
            entry_key,
            VersionedDocument {
                key: key.to_string(),
                version,
                body: document.body,
                domain: document.domain,
                timestamp: document.timestamp,
            },
        );
        Ok(version)
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<VersionedDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(filter.select(
            documents
                .iter()
                .filter(|((c, _), _)| *c == collection)
                .map(|(_, d)| d.clone()),
        ))
    }
}
