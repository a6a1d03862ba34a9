//! In-memory blob store.

use crate::domain::types::is_valid_key;
use crate::ports::outbound::{BlobStore, StorageError};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-memory blob store for tests and non-persistent embedding.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_key(key: &str) -> Result<(), StorageError> {
        if is_valid_key(key) {
            Ok(())
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        Self::check_key(key)?;
        self.entries.write().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Self::check_key(key)?;
        Ok(self.entries.read().get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Self::check_key(key)?;
        Ok(self.entries.read().contains_key(key))
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
