//! Storage Adapter
//!
//! Translates logical paths and datasets to and from an object store. Owns
//! the store handle only; datasets are never cached here.

use super::formats::codec_for;
use super::path::ObjectPath;
use super::store::{ObjectStore, StoreError};
use crate::dataset::Dataset;
use crate::error::{PipelineError, PipelineResult};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct StorageAdapter {
    store: Arc<dyn ObjectStore>,
}

impl StorageAdapter {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Create the container if it does not exist yet (idempotent)
    pub async fn ensure_container(&self, name: &str) -> PipelineResult<()> {
        let exists = self
            .store
            .container_exists(name)
            .await
            .map_err(|e| PipelineError::StorageInit(format!("{}: {}", name, e)))?;

        if !exists {
            self.store
                .create_container(name)
                .await
                .map_err(|e| PipelineError::StorageInit(format!("{}: {}", name, e)))?;
            info!("Created storage container {}", name);
        }
        Ok(())
    }

    /// `{base}/{leaf}` composition
    pub fn build_path(base: &str, leaf: &str) -> ObjectPath {
        ObjectPath::join(base, leaf)
    }

    /// Fetch and deserialize a dataset; the suffix is checked before any fetch
    pub async fn load(&self, container: &str, path: &ObjectPath) -> PipelineResult<Dataset> {
        let codec = codec_for(path)?;
        let bytes = self
            .store
            .get_object(container, path.as_str())
            .await
            .map_err(|e| fetch_error(path, e))?;

        debug!(
            "Loaded {} bytes from {} as {}",
            bytes.len(),
            path,
            codec.format.name()
        );
        (codec.decode)(&bytes)
    }

    /// Serialize by suffix into a buffer, then write it with its explicit length
    pub async fn save(
        &self,
        dataset: &Dataset,
        container: &str,
        path: &ObjectPath,
    ) -> PipelineResult<()> {
        let codec = codec_for(path)?;
        let bytes = (codec.encode)(dataset)?;
        self.put_bytes(container, path, bytes).await
    }

    /// Write an opaque payload (report pages, error records)
    pub async fn put_bytes(
        &self,
        container: &str,
        path: &ObjectPath,
        bytes: Vec<u8>,
    ) -> PipelineResult<()> {
        let length = bytes.len();
        self.store
            .put_object(container, path.as_str(), bytes, length)
            .await
            .map_err(|e| PipelineError::Transport(format!("put {}: {}", path, e)))?;
        debug!("Wrote {} bytes to {}", length, path);
        Ok(())
    }

    /// Direct object keys under `prefix`, directory markers excluded
    pub async fn list(&self, container: &str, prefix: &str) -> PipelineResult<Vec<ObjectPath>> {
        let entries = self
            .store
            .list_objects(container, prefix)
            .await
            .map_err(|e| PipelineError::StorageList(format!("{}/{}: {}", container, prefix, e)))?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .map(|entry| ObjectPath::from_key(entry.key))
            .collect())
    }
}

fn fetch_error(path: &ObjectPath, err: StoreError) -> PipelineError {
    match err {
        StoreError::NoSuchKey(_) => PipelineError::ObjectNotFound(path.to_string()),
        other => PipelineError::Transport(format!("get {}: {}", path, other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Column;
    use crate::storage::memory::MemoryStore;
    use async_trait::async_trait;
    use crate::storage::store::ObjectEntry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::numeric("age", vec![Some(31.0), None, Some(47.0)]),
            Column::text("name", vec![Some("Ada"), Some("Grace"), None]),
        ])
        .unwrap()
    }

    async fn adapter() -> StorageAdapter {
        let adapter = StorageAdapter::new(Arc::new(MemoryStore::new()));
        adapter.ensure_container("bucket").await.unwrap();
        adapter
    }

    #[tokio::test]
    async fn test_round_trip_every_format() {
        let adapter = adapter().await;
        let ds = sample();

        for leaf in ["people.csv", "people.json", "people.jsonl", "people.parquet"] {
            let path = StorageAdapter::build_path("proj/processed", leaf);
            adapter.save(&ds, "bucket", &path).await.unwrap();
            let loaded = adapter.load("bucket", &path).await.unwrap();
            assert_eq!(loaded, ds, "{}", leaf);
        }
    }

    #[tokio::test]
    async fn test_ensure_container_is_idempotent() {
        let adapter = adapter().await;
        adapter.ensure_container("bucket").await.unwrap();
        adapter.ensure_container("bucket").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let adapter = adapter().await;
        let err = adapter
            .load("bucket", &ObjectPath::from_key("proj/raw/missing.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ObjectNotFound(_)));
    }

    /// Counts fetches so tests can prove nothing was read
    struct CountingStore {
        inner: MemoryStore,
        gets: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn container_exists(&self, c: &str) -> Result<bool, StoreError> {
            self.inner.container_exists(c).await
        }
        async fn create_container(&self, c: &str) -> Result<(), StoreError> {
            self.inner.create_container(c).await
        }
        async fn get_object(&self, c: &str, k: &str) -> Result<Vec<u8>, StoreError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get_object(c, k).await
        }
        async fn put_object(&self, c: &str, k: &str, d: Vec<u8>, l: usize) -> Result<(), StoreError> {
            self.inner.put_object(c, k, d, l).await
        }
        async fn list_objects(&self, c: &str, p: &str) -> Result<Vec<ObjectEntry>, StoreError> {
            self.inner.list_objects(c, p).await
        }
    }

    #[tokio::test]
    async fn test_unsupported_suffix_reads_nothing() {
        let store = Arc::new(CountingStore {
            inner: MemoryStore::new(),
            gets: AtomicUsize::new(0),
        });
        let adapter = StorageAdapter::new(store.clone());
        adapter.ensure_container("bucket").await.unwrap();

        let err = adapter
            .load("bucket", &ObjectPath::from_key("data.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);

        let err = adapter
            .save(&sample(), "bucket", &ObjectPath::from_key("data.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_list_excludes_directory_markers() {
        let adapter = adapter().await;
        let ds = sample();
        for key in ["proj/raw/a.csv", "proj/raw/b.json", "proj/raw/old/c.csv"] {
            adapter.save(&ds, "bucket", &ObjectPath::from_key(key)).await.unwrap();
        }

        let listed = adapter.list("bucket", "proj/raw").await.unwrap();
        assert_eq!(
            listed,
            vec![
                ObjectPath::from_key("proj/raw/a.csv"),
                ObjectPath::from_key("proj/raw/b.json"),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_on_missing_container_fails() {
        let adapter = StorageAdapter::new(Arc::new(MemoryStore::new()));
        let err = adapter.list("nope", "proj/raw").await.unwrap_err();
        assert!(matches!(err, PipelineError::StorageList(_)));
    }
}
