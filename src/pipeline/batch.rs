//! Batch result accumulator
//!
//! Owned by the single aggregating task of a directory run; workers hand
//! their results back to it instead of touching shared counters.

use super::types::{BatchResult, FileDetail, FileSuccess, RunState};
use crate::error::PipelineError;
use indexmap::IndexMap;
use tracing::{debug, info};

pub struct BatchAccumulator {
    result: BatchResult,
}

impl BatchAccumulator {
    pub fn new(process_id: impl Into<String>) -> Self {
        Self {
            result: BatchResult {
                process_id: process_id.into(),
                status: RunState::Started,
                processed: 0,
                succeeded: 0,
                failed: 0,
                details: IndexMap::new(),
                message: None,
            },
        }
    }

    pub fn transition(&mut self, next: RunState) {
        debug!(
            process_id = %self.result.process_id,
            "Batch state {:?} -> {:?}", self.result.status, next
        );
        self.result.status = next;
    }

    /// Fold in one finished file, in whatever order files complete
    pub fn record(&mut self, file: String, outcome: Result<FileSuccess, PipelineError>) {
        let detail = match outcome {
            Ok(success) => {
                self.result.succeeded += 1;
                FileDetail::succeeded(success)
            }
            Err(e) => {
                self.result.failed += 1;
                FileDetail::failed(e.to_string())
            }
        };
        self.result.processed += 1;
        self.result.details.insert(file, detail);
    }

    pub fn complete(mut self) -> BatchResult {
        self.transition(RunState::Completed);
        info!(
            process_id = %self.result.process_id,
            processed = self.result.processed,
            succeeded = self.result.succeeded,
            failed = self.result.failed,
            "Batch completed"
        );
        self.result
    }

    /// Abort before dispatch; any partial results are discarded
    pub fn fail(mut self, message: impl Into<String>) -> BatchResult {
        self.transition(RunState::Failed);
        self.result.processed = 0;
        self.result.succeeded = 0;
        self.result.failed = 0;
        self.result.details.clear();
        self.result.message = Some(message.into());
        self.result
    }
}
