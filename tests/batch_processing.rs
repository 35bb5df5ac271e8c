//! Directory runs against a filesystem store with injected faults

use async_trait::async_trait;
use datagov_pipeline::dataset::{Column, ColumnData, Dataset};
use datagov_pipeline::pipeline::{ErrorLogEntry, GovernanceClient, NoopNarrator, RunState};
use datagov_pipeline::storage::{FsStore, ObjectEntry, ObjectPath, ObjectStore, StoreError};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

/// Delegates to an inner store, failing reads of one key, panicking on
/// another, and optionally failing the listing itself
struct FaultyStore {
    inner: FsStore,
    poisoned_key: Option<String>,
    panic_key: Option<String>,
    fail_listing: bool,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FaultyStore {
    fn new(inner: FsStore) -> Self {
        Self {
            inner,
            poisoned_key: None,
            panic_key: None,
            fail_listing: false,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn container_exists(&self, container: &str) -> Result<bool, StoreError> {
        self.inner.container_exists(container).await
    }

    async fn create_container(&self, container: &str) -> Result<(), StoreError> {
        self.inner.create_container(container).await
    }

    async fn get_object(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.poisoned_key.as_deref() == Some(key) {
            return Err(StoreError::NoSuchKey(key.to_string()));
        }
        if self.panic_key.as_deref() == Some(key) {
            panic!("store crashed reading {}", key);
        }
        self.inner.get_object(container, key).await
    }

    async fn put_object(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        length: usize,
    ) -> Result<(), StoreError> {
        self.inner.put_object(container, key, data, length).await
    }

    async fn list_objects(
        &self,
        container: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Io("listing unavailable".to_string()));
        }
        self.inner.list_objects(container, prefix).await
    }
}

fn sample(offset: f64) -> Dataset {
    Dataset::new(vec![
        Column::text("email", vec![Some("a@x.io"), Some("b@x.io"), Some("c@x.io"), None]),
        Column::numeric("x", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        Column::numeric(
            "y",
            vec![Some(offset + 2.0), None, Some(offset + 6.0), Some(offset + 8.0)],
        ),
    ])
    .unwrap()
}

async fn seed(store: Arc<FaultyStore>, names: &[&str]) -> GovernanceClient {
    let client = GovernanceClient::connect(store, "bucket", "proj", Arc::new(NoopNarrator))
        .await
        .unwrap();
    for (i, name) in names.iter().enumerate() {
        let path = ObjectPath::from_key(format!("proj/raw/{}", name));
        client
            .storage()
            .save(&sample(i as f64), "bucket", &path)
            .await
            .unwrap();
    }
    client
}

#[tokio::test]
async fn test_one_failing_file_does_not_affect_the_rest() {
    let dir = TempDir::new().unwrap();
    let mut store = FaultyStore::new(FsStore::new(dir.path()));
    store.poisoned_key = Some("proj/raw/b.json".to_string());
    let store = Arc::new(store);
    let client = seed(store.clone(), &["a.csv", "b.json", "c.parquet"]).await;

    let result = client.process_directory(&["email".to_string()], 2).await;

    assert_eq!(result.status, RunState::Completed);
    assert_eq!(result.processed, 3);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.processed, result.succeeded + result.failed);
    assert_eq!(result.details.len(), 3);

    let failed = serde_json::to_value(&result.details["proj/raw/b.json"]).unwrap();
    let message = failed["error"].as_str().unwrap();
    assert!(message.starts_with("File processing failed: proj/raw/b.json"), "{}", message);
    assert!(message.contains("Object not found"), "{}", message);

    for name in ["a.csv", "c.parquet"] {
        let processed = client
            .storage()
            .load("bucket", &ObjectPath::from_key(format!("proj/processed/{}", name)))
            .await
            .unwrap();
        match &processed.column("y").unwrap().data {
            ColumnData::Numeric(values) => assert!(values.iter().all(Option::is_some)),
            other => panic!("expected numeric y, got {:?}", other.kind()),
        }
        assert!(dir
            .path()
            .join(format!("bucket/proj/report/{}_report.html", name))
            .exists());
    }
    assert!(!dir.path().join("bucket/proj/processed/b.json").exists());

    let logs = store.list_objects("bucket", "proj/logs/errors").await.unwrap();
    assert_eq!(logs.len(), 1);
    let entry: ErrorLogEntry =
        serde_json::from_slice(&store.get_object("bucket", &logs[0].key).await.unwrap()).unwrap();
    assert!(entry.process_id.starts_with("proj-"));
}

#[tokio::test]
async fn test_panicking_worker_is_recorded_under_its_file() {
    let dir = TempDir::new().unwrap();
    let mut store = FaultyStore::new(FsStore::new(dir.path()));
    store.panic_key = Some("proj/raw/b.csv".to_string());
    let store = Arc::new(store);
    let client = seed(store.clone(), &["a.csv", "b.csv", "c.csv"]).await;

    let result = client.process_directory(&[], 3).await;

    assert_eq!(result.status, RunState::Completed);
    assert_eq!(result.processed, 3);
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed, 1);
    assert_eq!(result.details.len(), 3);

    let failed = serde_json::to_value(&result.details["proj/raw/b.csv"]).unwrap();
    let message = failed["error"].as_str().unwrap();
    assert!(message.starts_with("File processing failed: proj/raw/b.csv"), "{}", message);
    assert!(message.contains("worker aborted"), "{}", message);
}

#[tokio::test]
async fn test_pool_size_bounds_concurrent_reads() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FaultyStore::new(FsStore::new(dir.path())));
    let client = seed(store.clone(), &["a.csv", "b.csv", "c.csv", "d.csv", "e.csv"]).await;

    let result = client.process_directory(&[], 2).await;

    assert_eq!(result.succeeded, 5);
    assert!(store.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_listing_failure_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let mut store = FaultyStore::new(FsStore::new(dir.path()));
    store.fail_listing = true;
    let store = Arc::new(store);
    let client = seed(store.clone(), &["a.csv"]).await;

    let result = client.process_directory(&[], 4).await;

    assert_eq!(result.status, RunState::Failed);
    assert_eq!(result.processed, 0);
    assert!(result.message.unwrap().contains("listing unavailable"));
    assert!(!dir.path().join("bucket/proj/processed").exists());

    let batch_logs: Vec<_> = std::fs::read_dir(dir.path().join("bucket/proj/logs/errors"))
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("batch-"))
        .collect();
    assert_eq!(batch_logs.len(), 1);
}
