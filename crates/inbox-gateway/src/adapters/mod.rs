//! Adapters for the inbox gateway.
//!
//! Infrastructure implementations of the outbound ports.

pub mod error_conversions;
pub mod fs_store;
pub mod memory;
pub mod tokeninfo;

pub use fs_store::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use tokeninfo::{TokenInfoClaims, TokenInfoVerifier};
