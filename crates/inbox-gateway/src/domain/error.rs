//! Inbox error types.
//!
//! Every request failure is an [`InboxError`]; its [`ErrorKind`] decides the
//! HTTP status once, at the transport boundary.

/// Failure classes of the request surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller omitted or malformed input (400)
    BadRequest,
    /// Token could not be verified (400)
    Authentication,
    /// Verified caller is not allowed to do this (403)
    Authorization,
    /// Resource does not exist (404)
    NotFound,
    /// Verifier or storage failure (500)
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this class
    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::BadRequest | ErrorKind::Authentication => 400,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }
}

/// Errors returned by the request handlers.
#[derive(Debug, thiserror::Error)]
pub enum InboxError {
    #[error("Missing token")]
    MissingToken,

    /// Upload without a token in the form or `Authorization` header
    #[error("Missing ID token")]
    MissingIdToken,

    #[error("Missing parameters")]
    MissingParameters,

    #[error("No image uploaded")]
    MissingImage,

    #[error("Sender and receiver email required")]
    MissingParticipants,

    /// Body could not be decoded at all
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The reason is logged, never returned to the caller
    #[error("Invalid token")]
    InvalidToken { reason: String },

    #[error("Sender email does not match verified token email")]
    SenderMismatch,

    #[error("You are not authorized to download this image")]
    Unauthorized,

    #[error("You are not authorized to view this inbox")]
    InboxForbidden,

    #[error("Image not found")]
    ArtifactNotFound,

    #[error("Metadata not found")]
    MetadataNotFound,

    #[error("{0}")]
    VerificationUnavailable(String),

    #[error("{0}")]
    Storage(#[from] StorageError),
}

impl InboxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InboxError::MissingToken
            | InboxError::MissingIdToken
            | InboxError::MissingParameters
            | InboxError::MissingImage
            | InboxError::MissingParticipants
            | InboxError::MalformedRequest(_) => ErrorKind::BadRequest,
            InboxError::InvalidToken { .. } => ErrorKind::Authentication,
            InboxError::SenderMismatch
            | InboxError::Unauthorized
            | InboxError::InboxForbidden => ErrorKind::Authorization,
            InboxError::ArtifactNotFound | InboxError::MetadataNotFound => ErrorKind::NotFound,
            InboxError::VerificationUnavailable(_) | InboxError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn invalid_token(reason: impl Into<String>) -> Self {
        InboxError::InvalidToken {
            reason: reason.into(),
        }
    }
}

impl From<VerifyError> for InboxError {
    fn from(e: VerifyError) -> Self {
        match e {
            VerifyError::InvalidToken(reason) => InboxError::InvalidToken { reason },
            VerifyError::Unavailable(reason) => InboxError::VerificationUnavailable(reason),
        }
    }
}

/// Result type for handler operations
pub type InboxResult<T> = Result<T, InboxError>;

/// Identity verification failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Malformed, expired, or issued for another audience
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The identity provider could not be reached or answered garbage
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Key is not a flat name
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be decoded
    #[error("corrupt record {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error("record encoding failed: {0}")]
    Encode(String),
}

/// Server lifecycle errors (not request errors)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage initialisation failed: {0}")]
    Storage(String),

    #[error("identity verifier initialisation failed: {0}")]
    Verifier(String),

    #[error("server bind error: {0}")]
    Bind(String),

    #[error("server error: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(InboxError::MissingToken.status_code(), 400);
        assert_eq!(InboxError::MissingIdToken.status_code(), 400);
        assert_eq!(InboxError::MissingParameters.status_code(), 400);
        assert_eq!(InboxError::MissingImage.status_code(), 400);
        assert_eq!(InboxError::MissingParticipants.status_code(), 400);
        assert_eq!(InboxError::invalid_token("expired").status_code(), 400);
        assert_eq!(InboxError::SenderMismatch.status_code(), 403);
        assert_eq!(InboxError::Unauthorized.status_code(), 403);
        assert_eq!(InboxError::ArtifactNotFound.status_code(), 404);
        assert_eq!(InboxError::MetadataNotFound.status_code(), 404);
        assert_eq!(
            InboxError::VerificationUnavailable("down".into()).status_code(),
            500
        );
    }

    #[test]
    fn test_invalid_token_hides_reason() {
        let err = InboxError::invalid_token("audience mismatch: other-client");
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn test_internal_errors_carry_message() {
        let err: InboxError = StorageError::Corrupt {
            key: "a.json".into(),
            message: "expected value".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("a.json"));
    }

    #[test]
    fn test_from_verify_error() {
        let err: InboxError = VerifyError::InvalidToken("expired".into()).into();
        assert!(matches!(err, InboxError::InvalidToken { .. }));

        let err: InboxError = VerifyError::Unavailable("connection refused".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("connection refused"));
    }
}
