//! Result types for the governance pipeline

use crate::engine::Report;
use crate::storage::ObjectPath;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Artifacts of one successfully processed file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSuccess {
    pub processed_path: ObjectPath,
    pub report: Report,
    pub report_path: ObjectPath,
}

/// Result of the single-file entry point; failures never escape as errors
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Success(FileSuccess),
    Error { message: String },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Success(_))
    }
}

/// Per-file entry of a batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FileDetail {
    Succeeded(FileOutcome),
    Failed { error: String },
}

impl FileDetail {
    pub fn succeeded(success: FileSuccess) -> Self {
        FileDetail::Succeeded(FileOutcome::Success(success))
    }

    pub fn failed(message: impl Into<String>) -> Self {
        FileDetail::Failed {
            error: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileDetail::Failed { .. })
    }
}

/// Lifecycle of a directory run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Started,
    Listing,
    Dispatching,
    Aggregating,
    Completed,
    #[serde(rename = "error")]
    Failed,
}

/// Aggregate over a directory run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub process_id: String,
    pub status: RunState,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// File key -> outcome, in completion order
    pub details: IndexMap<String, FileDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Persisted record of a top-level failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: DateTime<Utc>,
    pub process_id: String,
    pub error: String,
}

impl ErrorLogEntry {
    pub fn now(process_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            process_id: process_id.into(),
            error: error.into(),
        }
    }
}
