//! Processing Routes
//!
//! HTTP entry points for single-file and directory runs.

use crate::error::{validation_error, ApiResult};
use crate::models::{ProcessBatchRequest, ProcessFileRequest, SuccessResponse};
use crate::pipeline::{BatchResult, FileOutcome, RunState};
use crate::state::SharedState;
use crate::storage::ObjectPath;
use axum::{extract::State, Json};
use tracing::debug;
use validator::Validate;

/// Process one raw file
pub async fn process_file(
    State(state): State<SharedState>,
    Json(payload): Json<ProcessFileRequest>,
) -> ApiResult<Json<SuccessResponse<FileOutcome>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let fields = payload
        .sensitive_fields
        .unwrap_or_else(|| state.settings.pipeline.sensitive_fields.clone());
    let raw_path = payload.raw_path.map(ObjectPath::from_key);
    debug!("Processing request for {} (fields: {:?})", payload.filename, fields);

    let outcome = state
        .client
        .process_file(&payload.filename, &fields, raw_path)
        .await;

    let failure = match &outcome {
        FileOutcome::Success(_) => None,
        FileOutcome::Error { message } => Some(message.clone()),
    };
    Ok(Json(match failure {
        None => SuccessResponse::with_data(format!("Processed {}", payload.filename), outcome),
        Some(message) => SuccessResponse::failed_with(message, outcome),
    }))
}

/// Process every file under the raw directory
pub async fn process_batch(
    State(state): State<SharedState>,
    payload: Option<Json<ProcessBatchRequest>>,
) -> ApiResult<Json<SuccessResponse<BatchResult>>> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let fields = payload
        .sensitive_fields
        .unwrap_or_else(|| state.settings.pipeline.sensitive_fields.clone());
    let max_workers = payload
        .max_workers
        .unwrap_or(state.settings.pipeline.max_workers);

    let result = state.client.process_directory(&fields, max_workers).await;

    let status = result.status;
    Ok(Json(match status {
        RunState::Completed => SuccessResponse::with_data(
            format!(
                "Processed {} files: {} succeeded, {} failed",
                result.processed, result.succeeded, result.failed
            ),
            result,
        ),
        _ => SuccessResponse::failed_with(
            result.message.clone().unwrap_or_else(|| "Batch failed".to_string()),
            result,
        ),
    }))
}
