//! Outbound ports for the inbox gateway.
//!
//! Production: `FsBlobStore`, `TokenInfoVerifier`, `SystemTimeSource`
//! Testing: `InMemoryBlobStore`, `FailingBlobStore`, `StaticIdentityVerifier`, `FixedTimeSource`

use crate::domain::types::Identity;
use async_trait::async_trait;

pub use crate::domain::error::{StorageError, VerifyError};

/// External identity provider.
///
/// Any failure means "unauthenticated": callers must not proceed.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Resolve an opaque bearer token to a verified identity.
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

/// Flat key/bytes storage.
///
/// Keys are single path components; implementations reject anything else
/// with [`StorageError::InvalidKey`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous value.
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Fetch the bytes stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Check if a value exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// All stored keys, in store traversal order.
    async fn list(&self) -> Result<Vec<String>, StorageError>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Seconds since the Unix epoch
    fn now(&self) -> u64;
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            // Clock before Unix epoch - return 0 rather than panic
            .unwrap_or(0)
    }
}
