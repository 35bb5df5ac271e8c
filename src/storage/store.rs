//! Object store backend contract
//!
//! The pipeline depends on exactly four backend capabilities: container
//! existence/creation, object get, object put with an explicit length, and
//! non-recursive prefix listing.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by a backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("container '{0}' does not exist")]
    NoSuchContainer(String),

    #[error("no object at '{0}'")]
    NoSuchKey(String),

    #[error("declared length {declared} does not match payload length {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("backend I/O failure: {0}")]
    Io(String),
}

/// One entry of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectEntry {
    pub key: String,
    /// Directory marker (a common prefix) rather than an object
    pub is_dir: bool,
}

impl ObjectEntry {
    pub fn object(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_dir: false,
        }
    }

    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            is_dir: true,
        }
    }
}

/// Key-value object store addressed by `(container, key)`
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn container_exists(&self, container: &str) -> Result<bool, StoreError>;

    async fn create_container(&self, container: &str) -> Result<(), StoreError>;

    async fn get_object(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Write `data`; `length` must equal `data.len()`
    async fn put_object(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        length: usize,
    ) -> Result<(), StoreError>;

    /// Direct children of `prefix` (which is treated as a directory)
    async fn list_objects(
        &self,
        container: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectEntry>, StoreError>;
}

/// Normalise a listing prefix to `dir/` form
pub(crate) fn directory_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}/", trimmed)
    }
}

pub(crate) fn check_length(data: &[u8], length: usize) -> Result<(), StoreError> {
    if data.len() != length {
        return Err(StoreError::LengthMismatch {
            declared: length,
            actual: data.len(),
        });
    }
    Ok(())
}
