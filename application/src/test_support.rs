//! Shared mocks for unit tests in this crate.

use crate::ports::durable_store::{
    Collection, DocumentFilter, DocumentWrite, DurableStore, StoreError, VersionedDocument,
    WriteExpectation, check_expectation,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// In-process store with scripted failures.
///
/// Cloning shares the underlying documents, so a test can keep a handle
/// after moving a clone into the gateway.
#[derive(Clone, Default)]
pub(crate) struct MockStore {
    documents: Arc<Mutex<HashMap<(Collection, String), VersionedDocument>>>,
    put_failures: Arc<Mutex<VecDeque<(Collection, StoreError)>>>,
    puts: Arc<Mutex<Vec<(Collection, String)>>>,
}

impl MockStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the next put to `collection` with `error`
    pub(crate) fn fail_next_put(&self, collection: Collection, error: StoreError) {
        self.put_failures
            .lock()
            .unwrap()
            .push_back((collection, error));
    }

    pub(crate) fn document(&self, collection: Collection, key: &str) -> Option<VersionedDocument> {
        self.documents
            .lock()
            .unwrap()
            .get(&(collection, key.to_string()))
            .cloned()
    }

    /// Keys of successful puts, in order
    pub(crate) fn puts(&self) -> Vec<(Collection, String)> {
        self.puts.lock().unwrap().clone()
    }

    /// Overwrite a document directly, bumping its version
    pub(crate) fn tamper(&self, collection: Collection, key: &str, body: serde_json::Value) {
        let mut documents = self.documents.lock().unwrap();
        if let Some(doc) = documents.get_mut(&(collection, key.to_string())) {
            doc.body = body;
            doc.version += 1;
        }
    }
}

#[async_trait]
impl DurableStore for MockStore {
    async fn get(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<VersionedDocument>, StoreError> {
        Ok(self.document(collection, key))
    }

    async fn put(
        &self,
        collection: Collection,
        key: &str,
        document: DocumentWrite,
        expectation: WriteExpectation,
    ) -> Result<u64, StoreError> {
        {
            let mut failures = self.put_failures.lock().unwrap();
            if let Some(pos) = failures.iter().position(|(c, _)| *c == collection)
                && let Some((_, error)) = failures.remove(pos)
            {
                return Err(error);
            }
        }

        let mut documents = self.documents.lock().unwrap();
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
        self.puts.lock().unwrap().push((collection, key.to_string()));
        Ok(version)
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<VersionedDocument>, StoreError> {
        let documents = self.documents.lock().unwrap();
        Ok(filter.select(
            documents
                .iter()
                .filter(|((c, _), _)| *c == collection)
                .map(|(_, d)| d.clone()),
        ))
    }
}
