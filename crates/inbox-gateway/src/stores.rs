//! Artifact and metadata stores.
//!
//! Thin typed views over two [`BlobStore`]s. The two writes of an upload are
//! independent: a failure between them can leave one without the other.

use crate::domain::types::{ArtifactMetadata, ArtifactName, METADATA_SUFFIX};
use crate::ports::outbound::{BlobStore, StorageError};
use std::sync::Arc;

/// Raw uploaded bytes, keyed by artifact name.
#[derive(Clone)]
pub struct ArtifactStore {
    blobs: Arc<dyn BlobStore>,
}

impl ArtifactStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub async fn save(&self, name: &ArtifactName, bytes: &[u8]) -> Result<(), StorageError> {
        self.blobs.put(name.as_str(), bytes).await
    }

    pub async fn load(&self, name: &ArtifactName) -> Result<Option<Vec<u8>>, StorageError> {
        self.blobs.get(name.as_str()).await
    }

    pub async fn exists(&self, name: &ArtifactName) -> Result<bool, StorageError> {
        self.blobs.exists(name.as_str()).await
    }
}

/// One JSON record per artifact, keyed `{artifact name}.json`.
#[derive(Clone)]
pub struct MetadataStore {
    blobs: Arc<dyn BlobStore>,
}

impl MetadataStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub async fn save(&self, metadata: &ArtifactMetadata) -> Result<(), StorageError> {
        let name = ArtifactName::parse(&metadata.filename)
            .ok_or_else(|| StorageError::InvalidKey(metadata.filename.clone()))?;
        let bytes = serde_json::to_vec(metadata)?;
        self.blobs.put(&name.metadata_key(), &bytes).await
    }

    pub async fn load(&self, name: &ArtifactName) -> Result<Option<ArtifactMetadata>, StorageError> {
        let key = name.metadata_key();
        match self.blobs.get(&key).await? {
            Some(bytes) => decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Every record, in store traversal order.
    ///
    /// A single undecodable record fails the whole listing.
    pub async fn list(&self) -> Result<Vec<ArtifactMetadata>, StorageError> {
        let mut records = Vec::new();
        for key in self.blobs.list().await? {
            if !key.ends_with(METADATA_SUFFIX) {
                continue;
            }
            // Removed between list and get
            let Some(bytes) = self.blobs.get(&key).await? else {
                continue;
            };
            records.push(decode(&key, &bytes)?);
        }
        Ok(records)
    }

    /// Records whose receiver is exactly `email`.
    pub async fn for_receiver(&self, email: &str) -> Result<Vec<ArtifactMetadata>, StorageError> {
        let mut records = self.list().await?;
        records.retain(|m| m.is_addressed_to(email));
        Ok(records)
    }
}

fn decode(key: &str, bytes: &[u8]) -> Result<ArtifactMetadata, StorageError> {
    serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}
