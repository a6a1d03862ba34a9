//! Core types for the inbox: identities, artifact names, metadata records
//! and the request/response bodies of the HTTP surface.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Longest sanitised original name kept inside a generated artifact name.
///
/// Keeps `{32 hex}_{name}.json` well under common filesystem name limits.
pub const MAX_ORIGINAL_NAME_LEN: usize = 128;

/// Fallback used when the client-supplied name sanitises to nothing.
pub const DEFAULT_ORIGINAL_NAME: &str = "image";

/// Suffix of metadata record keys.
pub const METADATA_SUFFIX: &str = ".json";

/// Length of the hex id prefix of a generated name.
const ID_PREFIX_LEN: usize = 32;

/// Longest name [`ArtifactName::generate`] can produce.
pub const MAX_ARTIFACT_NAME_LEN: usize = ID_PREFIX_LEN + 1 + MAX_ORIGINAL_NAME_LEN;

/// Longest key a store accepts: an artifact name plus the metadata suffix.
pub const MAX_KEY_LEN: usize = MAX_ARTIFACT_NAME_LEN + METADATA_SUFFIX.len();

/// A verified caller, as returned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Provider subject id (`sub` claim)
    pub subject_id: String,
    /// Verified email address
    pub email: String,
}

impl Identity {
    pub fn new(subject_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            email: email.into(),
        }
    }
}

/// Metadata record stored alongside every artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub filename: String,
    pub sender_email: String,
    pub receiver_email: String,
}

impl ArtifactMetadata {
    pub fn new(
        name: &ArtifactName,
        sender_email: impl Into<String>,
        receiver_email: impl Into<String>,
    ) -> Self {
        Self {
            filename: name.as_str().to_string(),
            sender_email: sender_email.into(),
            receiver_email: receiver_email.into(),
        }
    }

    /// Whether this record is addressed to `email`.
    pub fn is_addressed_to(&self, email: &str) -> bool {
        self.receiver_email == email
    }
}

/// Opaque, collision-resistant artifact name: `{random hex}_{original name}`.
///
/// Every `ArtifactName` is a valid flat storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactName(String);

impl ArtifactName {
    /// Generate a fresh name for an upload called `original`.
    pub fn generate(original: &str) -> Self {
        Self::with_id(Uuid::new_v4(), original)
    }

    /// Build a name from an explicit id.
    pub fn with_id(id: Uuid, original: &str) -> Self {
        Self(format!("{}_{}", id.simple(), sanitize_original_name(original)))
    }

    /// Accept a client-supplied name, rejecting anything that is not a flat key
    /// or is longer than any generated name.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() <= MAX_ARTIFACT_NAME_LEN && is_valid_key(raw) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of the metadata record describing this artifact.
    pub fn metadata_key(&self) -> String {
        format!("{}{}", self.0, METADATA_SUFFIX)
    }

    /// File extension, lowercased.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.0.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Content type served on download. Unknown extensions fall back to PNG.
    pub fn content_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            Some("svg") => "image/svg+xml",
            _ => "image/png",
        }
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduce a client-supplied filename to a safe flat name.
///
/// Keeps only the last path component, maps everything outside
/// `[A-Za-z0-9._-]` to `_`, strips leading dots and bounds the length
/// (keeping the tail so the extension survives).
pub fn sanitize_original_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let mapped: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // mapped is pure ASCII, so byte slicing is char-aligned
    let tail = if mapped.len() > MAX_ORIGINAL_NAME_LEN {
        &mapped[mapped.len() - MAX_ORIGINAL_NAME_LEN..]
    } else {
        mapped.as_str()
    };

    let trimmed = tail.trim_start_matches('.');
    if trimmed.is_empty() {
        DEFAULT_ORIGINAL_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// A flat storage key: non-empty, bounded, no separators, no NUL, no leading dot.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && !key.contains(['/', '\\', '\0'])
}

// =============================================================================
// Request / response bodies
// =============================================================================

/// Body of `POST /verify_token`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyTokenRequest {
    pub token: Option<String>,
    pub id_token: Option<String>,
}

impl VerifyTokenRequest {
    /// First non-empty of `token`, `id_token`.
    pub fn token(&self) -> Option<&str> {
        first_non_empty([self.token.as_deref(), self.id_token.as_deref()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub message: String,
    pub user_id: String,
    pub email: String,
}

/// Upload input, collected from the multipart form and headers.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    /// `id_token` form field
    pub id_token: Option<String>,
    /// Raw `Authorization` header value
    pub authorization: Option<String>,
    pub image: Option<UploadedImage>,
    pub sender_email: Option<String>,
    pub receiver_email: Option<String>,
}

impl UploadForm {
    /// Form field wins over the header; a `Bearer ` prefix is stripped.
    pub fn token(&self) -> Option<&str> {
        first_non_empty([
            self.id_token.as_deref(),
            self.authorization.as_deref().map(strip_bearer),
        ])
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadedImage {
    /// Client-supplied filename
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
}

/// Body of `POST /download`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadRequest {
    #[serde(alias = "token")]
    pub id_token: Option<String>,
    pub filename: Option<String>,
}

/// Artifact bytes ready to be streamed back.
#[derive(Debug, Clone)]
pub struct ImageDownload {
    pub name: ArtifactName,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// JSON body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Strip an optional `Bearer ` scheme from an authorization value.
pub fn strip_bearer(value: &str) -> &str {
    let value = value.trim_start();
    match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ => value.trim_end(),
    }
}

fn first_non_empty<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates.into_iter().flatten().find(|s| !s.is_empty())
}


#[cfg(test)]
mod proptest_naming {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any client name yields a valid flat key.
        #[test]
        fn generated_names_are_valid_keys(original in ".*") {
            let name = ArtifactName::generate(&original);
            prop_assert!(is_valid_key(name.as_str()));
            prop_assert!(is_valid_key(&name.metadata_key()));
            prop_assert!(ArtifactName::parse(name.as_str()).is_some());
        }

        /// Sanitised names never carry separators and stay bounded.
        #[test]
        fn sanitized_names_are_flat(original in ".*") {
            let sanitized = sanitize_original_name(&original);
            prop_assert!(!sanitized.is_empty());
            prop_assert!(sanitized.len() <= MAX_ORIGINAL_NAME_LEN);
            prop_assert!(!sanitized.starts_with('.'));
            prop_assert!(!sanitized.contains(['/', '\\', '\0']));
        }

        /// Names already safe are preserved verbatim.
        #[test]
        fn safe_names_survive(original in "[A-Za-z0-9_-][A-Za-z0-9._-]{0,40}") {
            prop_assert_eq!(sanitize_original_name(&original), original);
        }
    }
}
