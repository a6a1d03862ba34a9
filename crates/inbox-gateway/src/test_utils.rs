//! Test doubles and fixtures shared by unit and integration tests.

use crate::adapters::InMemoryBlobStore;
use crate::domain::types::Identity;
use crate::handlers::InboxHandlers;
use crate::ports::outbound::{BlobStore, IdentityVerifier, StorageError, TimeSource, VerifyError};
use crate::stores::{ArtifactStore, MetadataStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Verifier with a fixed token → identity table.
///
/// Unknown tokens are `InvalidToken`; an outage makes every call `Unavailable`.
#[derive(Debug, Default)]
pub struct StaticIdentityVerifier {
    identities: HashMap<String, Identity>,
    outage: Option<String>,
    calls: AtomicUsize,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `token` as belonging to `email`.
    pub fn with_identity(mut self, token: &str, email: &str) -> Self {
        self.identities.insert(
            token.to_string(),
            Identity::new(format!("sub-{}", email), email),
        );
        self
    }

    /// A verifier whose provider is down.
    pub fn unavailable(message: &str) -> Self {
        Self {
            outage: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Number of verification calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.outage {
            return Err(VerifyError::Unavailable(message.clone()));
        }
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| VerifyError::InvalidToken("unknown token".into()))
    }
}

/// Clock stopped at a fixed instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedTimeSource {
    now: u64,
}

impl FixedTimeSource {
    pub fn new(now: u64) -> Self {
        Self { now }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> u64 {
        self.now
    }
}

/// Blob store whose backing disk is gone: writes fail with an I/O error
/// and nothing is ever found.
#[derive(Debug, Clone)]
pub struct FailingBlobStore {
    message: String,
}

impl FailingBlobStore {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    fn error(&self) -> StorageError {
        std::io::Error::other(self.message.clone()).into()
    }
}

#[async_trait]
impl BlobStore for FailingBlobStore {
    async fn put(&self, _key: &str, _bytes: &[u8]) -> Result<(), StorageError> {
        Err(self.error())
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Err(self.error())
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Err(self.error())
    }

    async fn list(&self) -> Result<Vec<String>, StorageError> {
        Err(self.error())
    }
}

/// Handlers wired to in-memory stores, with the stores exposed for inspection.
pub struct InboxFixture {
    pub handlers: Arc<InboxHandlers>,
    pub verifier: Arc<StaticIdentityVerifier>,
    pub artifacts: Arc<InMemoryBlobStore>,
    pub metadata: Arc<InMemoryBlobStore>,
}

impl InboxFixture {
    pub fn new(verifier: StaticIdentityVerifier) -> Self {
        Self::build(verifier, false)
    }

    /// Fixture whose inbox listing requires a matching token.
    pub fn with_inbox_auth(verifier: StaticIdentityVerifier) -> Self {
        Self::build(verifier, true)
    }

    /// alice, bob and carol at `x`, with tokens `T_alice`, `T_bob`, `T_carol`.
    pub fn standard() -> Self {
        Self::new(standard_verifier())
    }

    fn build(verifier: StaticIdentityVerifier, inbox_requires_auth: bool) -> Self {
        let verifier = Arc::new(verifier);
        let artifacts = Arc::new(InMemoryBlobStore::new());
        let metadata = Arc::new(InMemoryBlobStore::new());

        let handlers = InboxHandlers::new(
            verifier.clone(),
            ArtifactStore::new(artifacts.clone()),
            MetadataStore::new(metadata.clone()),
        )
        .with_inbox_auth(inbox_requires_auth);

        Self {
            handlers: Arc::new(handlers),
            verifier,
            artifacts,
            metadata,
        }
    }
}

/// Verifier knowing `T_alice`, `T_bob` and `T_carol`.
pub fn standard_verifier() -> StaticIdentityVerifier {
    StaticIdentityVerifier::new()
        .with_identity("T_alice", "alice@x")
        .with_identity("T_bob", "bob@x")
        .with_identity("T_carol", "carol@x")
}

/// Minimal `multipart/form-data` body builder.
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    boundary: String,
    body: Vec<u8>,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBuilder {
    pub fn new() -> Self {
        Self {
            boundary: "inbox-test-boundary-7MA4YWxkTrZu0gW".to_string(),
            body: Vec::new(),
        }
    }

    /// Add a plain text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a file field.
    pub fn file(mut self, name: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                name, filename
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Returns the `Content-Type` header value and the encoded body.
    pub fn finish(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            format!("multipart/form-data; boundary={}", self.boundary),
            self.body,
        )
    }
}
