//! `download`: hand an artifact to its designated receiver.

use super::{non_empty, InboxHandlers};
use crate::domain::error::{InboxError, InboxResult};
use crate::domain::types::{ArtifactName, DownloadRequest, ImageDownload};
use tracing::{info, warn};

impl InboxHandlers {
    /// Only the receiver named in the metadata record may fetch the bytes;
    /// the sender cannot re-download through this path.
    pub async fn download(&self, request: DownloadRequest) -> InboxResult<ImageDownload> {
        let (token, filename) = match (
            non_empty(request.id_token.as_deref()),
            non_empty(request.filename.as_deref()),
        ) {
            (Some(token), Some(filename)) => (token, filename),
            _ => return Err(InboxError::MissingParameters),
        };

        let identity = self.verifier.verify(token).await?;

        // Not a flat key: nothing by that name can exist
        let name = ArtifactName::parse(filename).ok_or(InboxError::ArtifactNotFound)?;

        if !self.artifacts.exists(&name).await? {
            return Err(InboxError::ArtifactNotFound);
        }

        let metadata = self
            .metadata
            .load(&name)
            .await?
            .ok_or(InboxError::MetadataNotFound)?;

        if !metadata.is_addressed_to(&identity.email) {
            warn!(
                filename = %name,
                caller = %identity.email,
                "Download denied"
            );
            return Err(InboxError::Unauthorized);
        }

        let bytes = self
            .artifacts
            .load(&name)
            .await?
            .ok_or(InboxError::ArtifactNotFound)?;

        info!(filename = %name, receiver = %identity.email, size = bytes.len(), "Image downloaded");

        Ok(ImageDownload {
            content_type: name.content_type(),
            name,
            bytes,
        })
    }
}
