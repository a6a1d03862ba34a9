//! Inbox Gateway - HTTP interface for exchanging images between verified users.
//!
//! A sender uploads an image addressed to another user's email; the receiver
//! lists their inbox and downloads the images addressed to them. Identity is
//! delegated to an external token-info endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     INBOX GATEWAY                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │   POST /verify_token   POST /upload   POST /download         │
//! │   GET  /inbox/{email}  GET  /health                          │
//! │                          │                                   │
//! │  ┌───────────────────────┴──────────────────────┐            │
//! │  │     Middleware:  CORS → Tracing → BodyLimit  │            │
//! │  └───────────────────────┬──────────────────────┘            │
//! │                          │                                   │
//! │  ┌───────────────────────┴──────────────────────┐            │
//! │  │     InboxHandlers (authorization policy)     │            │
//! │  └─────┬──────────────────┬─────────────────┬───┘            │
//! │        │                  │                 │                │
//! │  IdentityVerifier   ArtifactStore     MetadataStore          │
//! └────────┼──────────────────┼─────────────────┼────────────────┘
//!          ▼                  ▼                 ▼
//!   token-info endpoint   inbox/          inbox_metadata/
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use inbox_gateway::{GatewayConfig, InboxGatewayService};
//!
//! let config = GatewayConfig::from_env()?;
//! let service = InboxGatewayService::new(config)?;
//! service.start(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;
pub mod stores;
pub mod test_utils;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ErrorKind, GatewayError, InboxError, InboxResult};
pub use domain::types::*;
pub use handlers::InboxHandlers;
pub use ports::outbound::{BlobStore, IdentityVerifier, StorageError, TimeSource, VerifyError};
pub use router::build_router;
pub use service::InboxGatewayService;
pub use stores::{ArtifactStore, MetadataStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
