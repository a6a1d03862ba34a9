//! Error conversions involving transport and I/O types.
//!
//! These conversions belong in the adapters layer: the domain only knows
//! status codes as numbers.

use crate::domain::error::{ErrorKind, InboxError, StorageError};
use crate::domain::types::ErrorBody;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};

impl IntoResponse for InboxError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self {
            InboxError::InvalidToken { reason } => {
                warn!(status = status.as_u16(), reason = %reason, "Token rejected");
            }
            e if e.kind() == ErrorKind::Internal => {
                error!(status = status.as_u16(), error = %e, "Request failed");
            }
            e => {
                warn!(status = status.as_u16(), error = %e, "Request denied");
            }
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for InboxError {
    fn from(e: MultipartError) -> Self {
        InboxError::MalformedRequest(e.body_text())
    }
}

impl From<serde_json::Error> for InboxError {
    fn from(e: serde_json::Error) -> Self {
        InboxError::MalformedRequest(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Encode(e.to_string())
    }
}
