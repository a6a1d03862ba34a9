//! Ports (hexagonal boundaries) of the inbox gateway.

pub mod outbound;

pub use outbound::{
    BlobStore, IdentityVerifier, StorageError, SystemTimeSource, TimeSource, VerifyError,
};
