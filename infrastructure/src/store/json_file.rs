//! Directory-backed document store.
//!
//! Layout: `<root>/<collection>/<key>.json`, one envelope per document
//! holding the version, query metadata and body. Writes go to a temporary
//! file that is renamed over the target, so readers never see a partial
//! document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use council_application::ports::durable_store::check_expectation;
use council_application::{
    Collection, DocumentFilter, DocumentWrite, DurableStore, StoreError, VersionedDocument,
    WriteExpectation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    key: String,
    version: u64,
    #[serde(default)]
    domain: Option<String>,
    timestamp: DateTime<Utc>,
    body: Value,
}

impl From<Envelope> for VersionedDocument {
    fn from(envelope: Envelope) -> Self {
        VersionedDocument {
            key: envelope.key,
            version: envelope.version,
            body: envelope.body,
            domain: envelope.domain,
            timestamp: envelope.timestamp,
        }
    }
}

/// Document store persisting JSON files under a root directory.
///
/// Version checks and writes are serialized through one in-process lock;
/// the store assumes it is the only writer to its directory.
pub struct JsonFileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `root`
    pub async fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        for collection in [Collection::Sessions, Collection::Metrics, Collection::Memories] {
            tokio::fs::create_dir_all(root.join(collection.as_str()))
                .await
                .map_err(|e| io_error(&root, e))?;
        }
        debug!("Opened JSON store at {}", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, collection: Collection, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self
            .root
            .join(collection.as_str())
            .join(format!("{}.json", key)))
    }

    async fn read(&self, path: &Path) -> Result<Option<Envelope>, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl DurableStore for JsonFileStore {
    async fn get(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<VersionedDocument>, StoreError> {
        let path = self.document_path(collection, key)?;
        Ok(self.read(&path).await?.map(VersionedDocument::from))
    }

    async fn put(
        &self,
        collection: Collection,
        key: &str,
        document: DocumentWrite,
        expectation: WriteExpectation,
    ) -> Result<u64, StoreError> {
        let path = self.document_path(collection, key)?;
        let _guard = self.write_lock.lock().await;

        let current = self.read(&path).await?.map(|e| e.version).unwrap_or(0);
        check_expectation(key, current, expectation)?;

        let envelope = Envelope {
            key: key.to_string(),
            version: current + 1,
            domain: document.domain,
            timestamp: document.timestamp,
            body: document.body,
        };
        let bytes = serde_json::to_vec_pretty(&envelope)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| io_error(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        Ok(envelope.version)
    }

    async fn query(
        &self,
        collection: Collection,
        filter: &DocumentFilter,
    ) -> Result<Vec<VersionedDocument>, StoreError> {
        let dir = self.root.join(collection.as_str());
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| io_error(&dir, e))?;

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read(&path).await {
                Ok(Some(envelope)) => documents.push(VersionedDocument::from(envelope)),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable document: {}", e),
            }
        }
        Ok(filter.select(documents))
    }
}

/// Keys become file names, so only a conservative character set is allowed
fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::Serialization(format!("invalid document key '{}'", key)))
    }
}

fn io_error(path: &Path, error: std::io::Error) -> StoreError {
    StoreError::Unavailable(format!("{}: {}", path.display(), error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use council_domain::TimeWindow;
    use serde_json::json;

    fn write(domain: &str, timestamp: DateTime<Utc>) -> DocumentWrite {
        DocumentWrite {
            body: json!({"text": "hello", "domain": domain}),
            domain: Some(domain.to_string()),
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        let now = Utc::now();

        let version = store
            .put(Collection::Sessions, "ses-1", write("ethics", now), WriteExpectation::Version(0))
            .await
            .unwrap();
        assert_eq!(version, 1);

        let document = store.get(Collection::Sessions, "ses-1").await.unwrap().unwrap();
        assert_eq!(document.version, 1);
        assert_eq!(document.body["text"], "hello");
        assert_eq!(document.domain.as_deref(), Some("ethics"));
        assert_eq!(document.timestamp, now);
        assert!(dir.path().join("sessions").join("ses-1.json").exists());
        assert!(!dir.path().join("sessions").join("ses-1.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::open(dir.path()).await.unwrap();
            store
                .put(Collection::Memories, "mem-1", write("ethics", Utc::now()), WriteExpectation::Absent)
                .await
                .unwrap();
        }

        let store = JsonFileStore::open(dir.path()).await.unwrap();
        assert!(store.get(Collection::Memories, "mem-1").await.unwrap().is_some());
        let err = store
            .put(Collection::Memories, "mem-1", write("ethics", Utc::now()), WriteExpectation::Absent)
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::AlreadyExists("mem-1".to_string()));
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        let now = Utc::now();
        store
            .put(Collection::Sessions, "s", write("ethics", now), WriteExpectation::Version(0))
            .await
            .unwrap();

        let err = store
            .put(Collection::Sessions, "s", write("ethics", now), WriteExpectation::Version(0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::VersionMismatch { actual: 1, .. }));
    }

    #[tokio::test]
    async fn test_query_skips_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();
        let now = Utc::now();

        store
            .put(Collection::Memories, "old", write("ethics", now - Duration::days(2)), WriteExpectation::Absent)
            .await
            .unwrap();
        store
            .put(Collection::Memories, "new", write("ethics", now), WriteExpectation::Absent)
            .await
            .unwrap();
        store
            .put(Collection::Memories, "art", write("art", now), WriteExpectation::Absent)
            .await
            .unwrap();
        std::fs::write(dir.path().join("memories").join("broken.json"), b"{not json").unwrap();

        let filter = DocumentFilter {
            domain: Some("ethics".to_string()),
            window: TimeWindow::all(),
            limit: None,
        };
        let keys: Vec<String> = store
            .query(Collection::Memories, &filter)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.key)
            .collect();
        assert_eq!(keys, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).await.unwrap();

        for key in ["../escape", "a/b", ".hidden", ""] {
            let err = store.get(Collection::Sessions, key).await.unwrap_err();
            assert!(matches!(err, StoreError::Serialization(_)), "{key}");
        }
    }
}
