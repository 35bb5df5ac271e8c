//! Error handling module
//!
//! Provides the pipeline error taxonomy and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Pipeline-wide error type
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage initialization failed: {0}")]
    StorageInit(String),

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Directory listing failed: {0}")]
    StorageList(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to {action} {format} payload: {message}")]
    Codec {
        action: &'static str,
        format: &'static str,
        message: String,
    },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("No files to process under {0}")]
    EmptyDirectory(String),

    #[error("Transformation failed: {0}")]
    Transformation(String),

    #[error("Report rendering failed: {0}")]
    ReportRender(String),

    #[error("File processing failed: {file} - {source}")]
    RuntimeFile {
        file: String,
        #[source]
        source: Box<PipelineError>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl PipelineError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::StorageInit(_) => "STORAGE_INIT_ERROR",
            PipelineError::ObjectNotFound(_) => "OBJECT_NOT_FOUND",
            PipelineError::Transport(_) => "TRANSPORT_ERROR",
            PipelineError::StorageList(_) => "STORAGE_LIST_ERROR",
            PipelineError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT",
            PipelineError::Codec { .. } => "CODEC_ERROR",
            PipelineError::InvalidDataset(_) => "INVALID_DATASET",
            PipelineError::EmptyDirectory(_) => "EMPTY_DIRECTORY",
            PipelineError::Transformation(_) => "TRANSFORMATION_ERROR",
            PipelineError::ReportRender(_) => "REPORT_RENDER_ERROR",
            PipelineError::RuntimeFile { .. } => "RUNTIME_FILE_ERROR",
            PipelineError::InvalidArgument(_) => "INVALID_ARGUMENT",
            PipelineError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Wrap a per-file failure raised during batch dispatch
    pub fn runtime_file(file: impl Into<String>, source: PipelineError) -> Self {
        PipelineError::RuntimeFile {
            file: file.into(),
            source: Box::new(source),
        }
    }
}

/// Result alias used throughout the pipeline
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Pipeline(e) => {
                let status = match e {
                    PipelineError::ObjectNotFound(_) => StatusCode::NOT_FOUND,
                    PipelineError::UnsupportedFormat(_)
                    | PipelineError::InvalidArgument(_)
                    | PipelineError::EmptyDirectory(_) => StatusCode::BAD_REQUEST,
                    PipelineError::Transport(_) | PipelineError::StorageList(_) => {
                        StatusCode::BAD_GATEWAY
                    }
                    _ => {
                        error!("Pipeline error: {:?}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, e.code(), e.to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}
