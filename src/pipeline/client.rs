//! Governance client
//!
//! Drives the per-file stages (load, anonymize, impute, report, save) and
//! fans a whole raw directory out to a bounded pool of workers.

use super::batch::BatchAccumulator;
use super::narrator::{processing_directive, Narrator};
use super::types::{BatchResult, ErrorLogEntry, FileOutcome, FileSuccess, RunState};
use crate::engine::{clean_data, generate_report, render_html, ImputerConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::storage::{ObjectPath, ObjectStore, StorageAdapter};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct GovernanceClient {
    storage: StorageAdapter,
    narrator: Arc<dyn Narrator>,
    bucket: Arc<str>,
    base_path: Arc<str>,
    imputer: ImputerConfig,
}

impl GovernanceClient {
    /// Bind to a bucket, creating it when missing
    pub async fn connect(
        store: Arc<dyn ObjectStore>,
        bucket: &str,
        base_path: &str,
        narrator: Arc<dyn Narrator>,
    ) -> PipelineResult<Self> {
        let storage = StorageAdapter::new(store);
        storage.ensure_container(bucket).await?;
        info!("Governance client bound to {}/{}", bucket, base_path);

        Ok(Self {
            storage,
            narrator,
            bucket: Arc::from(bucket),
            base_path: Arc::from(base_path.trim_end_matches('/')),
            imputer: ImputerConfig::default(),
        })
    }

    pub fn with_imputer(mut self, imputer: ImputerConfig) -> Self {
        self.imputer = imputer;
        self
    }

    pub fn storage(&self) -> &StorageAdapter {
        &self.storage
    }

    fn area(&self, name: &str) -> String {
        format!("{}/{}", self.base_path, name)
    }

    /// Process one file from `{base}/raw` (or `raw_path`).
    ///
    /// Never fails: any stage error is logged under a fresh
    /// `{base}-{uuid}` process id and returned as an error outcome.
    pub async fn process_file(
        &self,
        filename: &str,
        sensitive_fields: &[String],
        raw_path: Option<ObjectPath>,
    ) -> FileOutcome {
        match self.run_file(filename, sensitive_fields, raw_path).await {
            Ok(success) => FileOutcome::Success(success),
            Err(e) => {
                let process_id = format!("{}-{}", self.base_path, Uuid::new_v4());
                self.log_error(&process_id, &e.to_string()).await;
                FileOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    async fn run_file(
        &self,
        filename: &str,
        sensitive_fields: &[String],
        raw_path: Option<ObjectPath>,
    ) -> PipelineResult<FileSuccess> {
        let raw_path =
            raw_path.unwrap_or_else(|| StorageAdapter::build_path(&self.area("raw"), filename));
        let processed_path = StorageAdapter::build_path(&self.area("processed"), filename);
        let report_path = StorageAdapter::build_path(
            &self.area("report"),
            &format!("{}_report.html", filename),
        );

        self.narrate(processing_directive(raw_path.as_str(), sensitive_fields));

        let dataset = self.storage.load(&self.bucket, &raw_path).await?;
        debug!("Processing {} ({:?})", raw_path, dataset.shape());

        let fields = sensitive_fields.to_vec();
        let imputer = self.imputer;
        let title = format!("Data quality report: {}", filename);
        let (dataset, report, page) = tokio::task::spawn_blocking(move || {
            let dataset = clean_data(dataset, &fields, &imputer)?;
            let report = generate_report(&dataset);
            let page = render_html(&report, &title)?;
            Ok::<_, PipelineError>((dataset, report, page))
        })
        .await
        .map_err(|e| PipelineError::Transformation(format!("transform task aborted: {}", e)))??;

        self.storage
            .save(&dataset, &self.bucket, &processed_path)
            .await?;
        self.storage
            .put_bytes(&self.bucket, &report_path, page.into_bytes())
            .await?;

        info!("Processed {} -> {}", raw_path, processed_path);
        Ok(FileSuccess {
            processed_path,
            report,
            report_path,
        })
    }

    /// Batch worker body: failures are logged and wrapped with the file key
    async fn process_listed(
        &self,
        raw_path: ObjectPath,
        sensitive_fields: &[String],
    ) -> PipelineResult<FileSuccess> {
        let filename = raw_path.file_name().to_string();
        let key = raw_path.to_string();
        match self.run_file(&filename, sensitive_fields, Some(raw_path)).await {
            Ok(success) => Ok(success),
            Err(e) => {
                let process_id = format!("{}-{}", self.base_path, Uuid::new_v4());
                self.log_error(&process_id, &e.to_string()).await;
                Err(PipelineError::runtime_file(key, e))
            }
        }
    }

    /// Process every object directly under `{base}/raw` with at most
    /// `max_workers` files in flight.
    ///
    /// One file failing never affects the others. Listing failures, an empty
    /// directory and a zero pool size fail the whole run before any worker
    /// starts; those are logged under a `batch-{uuid}` process id.
    pub async fn process_directory(
        &self,
        sensitive_fields: &[String],
        max_workers: usize,
    ) -> BatchResult {
        let process_id = format!("batch-{}", Uuid::new_v4());
        let mut acc = BatchAccumulator::new(process_id.clone());
        info!(process_id = %process_id, "Batch started");

        match self.dispatch(&mut acc, sensitive_fields, max_workers).await {
            Ok(()) => acc.complete(),
            Err(e) => {
                let message = format!("Batch processing failed: {}", e);
                self.log_error(&process_id, &message).await;
                acc.fail(e.to_string())
            }
        }
    }

    async fn dispatch(
        &self,
        acc: &mut BatchAccumulator,
        sensitive_fields: &[String],
        max_workers: usize,
    ) -> PipelineResult<()> {
        acc.transition(RunState::Listing);
        let raw_dir = self.area("raw");
        let files = self.storage.list(&self.bucket, &raw_dir).await?;
        if files.is_empty() {
            return Err(PipelineError::EmptyDirectory(raw_dir));
        }

        acc.transition(RunState::Dispatching);
        if max_workers == 0 {
            return Err(PipelineError::InvalidArgument(
                "max_workers must be at least 1".to_string(),
            ));
        }
        info!("Dispatching {} files to {} workers", files.len(), max_workers);

        let permits = Arc::new(Semaphore::new(max_workers));
        let fields: Arc<[String]> = Arc::from(sensitive_fields);
        let mut workers = JoinSet::new();
        let mut keys: HashMap<task::Id, String> = HashMap::new();
        for raw_path in files {
            let client = self.clone();
            let permits = Arc::clone(&permits);
            let fields = Arc::clone(&fields);
            let key = raw_path.to_string();
            let handle = workers.spawn(async move {
                let _permit = permits.acquire_owned().await.map_err(|e| {
                    PipelineError::runtime_file(
                        raw_path.to_string(),
                        PipelineError::InvalidArgument(e.to_string()),
                    )
                })?;
                client.process_listed(raw_path, &fields).await
            });
            keys.insert(handle.id(), key);
        }

        acc.transition(RunState::Aggregating);
        while let Some(joined) = workers.join_next_with_id().await {
            // A panicking worker still counts as that file's failure
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(e) => {
                    error!("Batch worker aborted: {}", e);
                    let cause = PipelineError::Transformation(format!("worker aborted: {}", e));
                    (e.id(), Err(cause))
                }
            };
            let Some(key) = keys.remove(&id) else {
                error!("Batch worker {} finished without a file key", id);
                continue;
            };
            let outcome = outcome.map_err(|e| match e {
                wrapped @ PipelineError::RuntimeFile { .. } => wrapped,
                other => PipelineError::runtime_file(key.clone(), other),
            });
            acc.record(key, outcome);
        }
        Ok(())
    }

    /// Persist an error record to `{base}/logs/errors/{id}.json`; best effort
    async fn log_error(&self, process_id: &str, message: &str) {
        error!(process_id = %process_id, "{}", message);

        let entry = ErrorLogEntry::now(process_id, message);
        let path = StorageAdapter::build_path(
            &self.area("logs"),
            &format!("errors/{}.json", process_id),
        );
        let bytes = match serde_json::to_vec_pretty(&entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Could not encode error record {}: {}", process_id, e);
                return;
            }
        };
        if let Err(e) = self.storage.put_bytes(&self.bucket, &path, bytes).await {
            warn!("Could not persist error record {}: {}", process_id, e);
        }
    }

    fn narrate(&self, directive: String) {
        let narrator = Arc::clone(&self.narrator);
        tokio::spawn(async move {
            if let Err(e) = narrator.notify(&directive).await {
                warn!("{}", e);
            }
        });
    }
}
