//! Narration side channel
//!
//! Fire-and-forget messages describing what the pipeline is about to do.
//! Nothing returned here feeds back into processing; a failed notification is
//! logged and ignored.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
#[error("narration failed: {0}")]
pub struct NarrationError(pub String);

#[async_trait]
pub trait Narrator: Send + Sync {
    async fn notify(&self, directive: &str) -> Result<(), NarrationError>;
}

/// Emits directives through the tracing subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNarrator;

#[async_trait]
impl Narrator for LogNarrator {
    async fn notify(&self, directive: &str) -> Result<(), NarrationError> {
        info!(target: "datagov_pipeline::narration", "{}", directive);
        Ok(())
    }
}

/// Discards directives
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNarrator;

#[async_trait]
impl Narrator for NoopNarrator {
    async fn notify(&self, _directive: &str) -> Result<(), NarrationError> {
        Ok(())
    }
}

/// Free-text processing brief for one file
pub fn processing_directive(raw_path: &str, sensitive_fields: &[String]) -> String {
    let fields = if sensitive_fields.is_empty() {
        "none".to_string()
    } else {
        sensitive_fields.join(", ")
    };
    format!(
        "Start processing file: {}\n\
         Requirements:\n\
         1. Sensitive fields: {}\n\
         2. Output format: same as source\n\
         3. Quality validation level: strict",
        raw_path, fields
    )
}
