//! Request handlers: validation and authorization policy over the stores.
//!
//! Every operation resolves a verified identity from the caller's token,
//! checks it against the emails in the request, then touches storage.
//! Handlers are transport-agnostic; `router` adapts them to HTTP.

pub mod download;
pub mod inbox;
pub mod upload;
pub mod verify;

use crate::domain::error::{InboxError, InboxResult};
use crate::domain::types::Identity;
use crate::ports::outbound::IdentityVerifier;
use crate::stores::{ArtifactStore, MetadataStore};
use std::sync::Arc;

/// All request handlers
pub struct InboxHandlers {
    verifier: Arc<dyn IdentityVerifier>,
    artifacts: ArtifactStore,
    metadata: MetadataStore,
    inbox_requires_auth: bool,
}

impl InboxHandlers {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        artifacts: ArtifactStore,
        metadata: MetadataStore,
    ) -> Self {
        Self {
            verifier,
            artifacts,
            metadata,
            inbox_requires_auth: false,
        }
    }

    /// Require a matching token on inbox listing.
    pub fn with_inbox_auth(mut self, required: bool) -> Self {
        self.inbox_requires_auth = required;
        self
    }

    pub fn inbox_requires_auth(&self) -> bool {
        self.inbox_requires_auth
    }

    /// Resolve a caller token; absent or empty is `MissingToken`.
    async fn authenticate(&self, token: Option<&str>) -> InboxResult<Identity> {
        let token = non_empty(token).ok_or(InboxError::MissingToken)?;
        Ok(self.verifier.verify(token).await?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
