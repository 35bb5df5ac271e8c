//! In-memory object store
//!
//! Containers are maps of key -> bytes kept behind a single lock. Useful for
//! tests and for running the pipeline without any external storage.

use super::store::{check_length, directory_prefix, ObjectEntry, ObjectStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default, Clone)]
pub struct MemoryStore {
    /// Container -> (Key -> Bytes)
    containers: Arc<RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn container_exists(&self, container: &str) -> Result<bool, StoreError> {
        Ok(self.containers.read().await.contains_key(container))
    }

    async fn create_container(&self, container: &str) -> Result<(), StoreError> {
        let mut containers = self.containers.write().await;
        containers.entry(container.to_string()).or_default();
        Ok(())
    }

    async fn get_object(&self, container: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let containers = self.containers.read().await;
        let objects = containers
            .get(container)
            .ok_or_else(|| StoreError::NoSuchContainer(container.to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }

    async fn put_object(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        length: usize,
    ) -> Result<(), StoreError> {
        check_length(&data, length)?;
        if key.is_empty() || key.ends_with('/') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }

        let mut containers = self.containers.write().await;
        let objects = containers
            .get_mut(container)
            .ok_or_else(|| StoreError::NoSuchContainer(container.to_string()))?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn list_objects(
        &self,
        container: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectEntry>, StoreError> {
        let containers = self.containers.read().await;
        let objects = containers
            .get(container)
            .ok_or_else(|| StoreError::NoSuchContainer(container.to_string()))?;

        let prefix = directory_prefix(prefix);
        let mut files = Vec::new();
        let mut dirs = BTreeSet::new();

        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((dir, _)) => {
                    dirs.insert(format!("{}{}/", prefix, dir));
                }
                None => files.push(ObjectEntry::object(key.clone())),
            }
        }

        files.extend(dirs.into_iter().map(ObjectEntry::dir));
        Ok(files)
    }
}
