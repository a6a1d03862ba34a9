//! Domain types for the inbox gateway.
//!
//! Configuration, the error taxonomy, and the records and bodies the
//! handlers work with. Nothing here performs I/O.

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigError, GatewayConfig};
pub use error::{ErrorKind, GatewayError, InboxError, InboxResult, StorageError, VerifyError};
pub use types::*;
