//! Inbox gateway service - server lifecycle.
//!
//! Wires configuration, stores and the identity verifier into
//! [`InboxHandlers`] and serves them over HTTP.

use crate::adapters::{FsBlobStore, TokenInfoVerifier};
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::handlers::InboxHandlers;
use crate::ports::outbound::{BlobStore, IdentityVerifier};
use crate::router::build_router;
use crate::stores::{ArtifactStore, MetadataStore};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Inbox gateway service state
pub struct InboxGatewayService {
    config: GatewayConfig,
    handlers: Arc<InboxHandlers>,
}

impl InboxGatewayService {
    /// Create the service with filesystem stores and the token-info verifier.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let artifacts = FsBlobStore::open(&config.storage.artifact_dir)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
        let metadata = FsBlobStore::open(&config.storage.metadata_dir)
            .map_err(|e| GatewayError::Storage(e.to_string()))?;
        let verifier = TokenInfoVerifier::new(&config.auth)?;

        Ok(Self::with_components(
            config,
            Arc::new(verifier),
            Arc::new(artifacts),
            Arc::new(metadata),
        ))
    }

    /// Create the service around caller-supplied components.
    pub fn with_components(
        config: GatewayConfig,
        verifier: Arc<dyn IdentityVerifier>,
        artifact_store: Arc<dyn BlobStore>,
        metadata_store: Arc<dyn BlobStore>,
    ) -> Self {
        let handlers = InboxHandlers::new(
            verifier,
            ArtifactStore::new(artifact_store),
            MetadataStore::new(metadata_store),
        )
        .with_inbox_auth(config.inbox.require_auth);

        Self {
            config,
            handlers: Arc::new(handlers),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn handlers(&self) -> Arc<InboxHandlers> {
        Arc::clone(&self.handlers)
    }

    /// Routes with middleware applied
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.handlers), &self.config)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;

        if !self.handlers.inbox_requires_auth() {
            warn!("Inbox listing is unauthenticated: any caller can list any inbox");
        }
        info!(
            addr = %addr,
            artifact_dir = %self.config.storage.artifact_dir.display(),
            metadata_dir = %self.config.storage.metadata_dir.display(),
            "Starting inbox gateway"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Received shutdown signal");
            })
            .await
            .map_err(|e| GatewayError::Serve(e.to_string()))?;

        info!("Inbox gateway stopped");
        Ok(())
    }
}
