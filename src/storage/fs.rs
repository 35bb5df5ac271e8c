//! Filesystem-backed object store
//!
//! A container is a directory under the store root and an object key is a
//! relative path inside it.

use super::store::{check_length, directory_prefix, ObjectEntry, ObjectStore, StoreError};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, StoreError> {
        if container.is_empty() || container.contains(['/', '\\']) || container == ".." {
            return Err(StoreError::InvalidKey(container.to_string()));
        }
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.container_dir(container)?.join(relative))
    }

    async fn require_container(&self, container: &str) -> Result<PathBuf, StoreError> {
        let dir = self.container_dir(container)?;
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(dir),
            Ok(_) => Err(StoreError::NoSuchContainer(container.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NoSuchContainer(container.to_string()))
            }
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

#[async_trait]
impl ObjectStore for FsStore {
    async fn container_exists(&self, container: &str) -> Result<bool, StoreError> {
        match self.require_container(container).await {
            Ok(_) => Ok(true),
            Err(StoreError::NoSuchContainer(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_container(&self, container: &str) -> Result<(), StoreError> {
        let dir = self.container_dir(container)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        debug!("Created container directory {}", dir.display());
        Ok(())
    }

    async fn get_object(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        self.require_container(container).await?;
        let path = self.object_path(container, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NoSuchKey(key.to_string()))
            }
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    async fn put_object(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        length: usize,
    ) -> Result<(), StoreError> {
        check_length(&data, length)?;
        self.require_container(container).await?;
        let path = self.object_path(container, key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }

    async fn list_objects(
        &self,
        container: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        let container_dir = self.require_container(container).await?;
        let prefix = directory_prefix(prefix);
        let dir = if prefix.is_empty() {
            container_dir
        } else {
            self.object_path(container, prefix.trim_end_matches('/'))?
        };

        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
            if file_type.is_dir() {
                entries.push(ObjectEntry::dir(format!("{}{}/", prefix, name)));
            } else {
                entries.push(ObjectEntry::object(format!("{}{}", prefix, name)));
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}
