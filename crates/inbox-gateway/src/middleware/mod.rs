//! HTTP middleware.
//!
//! Layer order: Request → CORS → Tracing → BodyLimit → Handler

pub mod cors;
pub mod tracing;

pub use cors::create_cors_layer;
pub use tracing::TracingLayer;
