//! `upload`: store an image addressed to another user.

use super::{non_empty, InboxHandlers};
use crate::domain::error::{InboxError, InboxResult};
use crate::domain::types::{ArtifactMetadata, ArtifactName, UploadForm, UploadResponse};
use tracing::{info, warn};

impl InboxHandlers {
    /// Verify the caller, check they are the claimed sender, then write the
    /// artifact and its metadata record.
    ///
    /// The receiver address is not checked in any way.
    pub async fn upload(&self, form: UploadForm) -> InboxResult<UploadResponse> {
        let token = form.token().ok_or(InboxError::MissingIdToken)?;
        let identity = self.authenticate(Some(token)).await?;

        let image = form.image.ok_or(InboxError::MissingImage)?;

        let (sender_email, receiver_email) = match (
            non_empty(form.sender_email.as_deref()),
            non_empty(form.receiver_email.as_deref()),
        ) {
            (Some(sender), Some(receiver)) => (sender, receiver),
            _ => return Err(InboxError::MissingParticipants),
        };

        if identity.email != sender_email {
            warn!(
                verified = %identity.email,
                claimed = %sender_email,
                "Upload sender does not match token"
            );
            return Err(InboxError::SenderMismatch);
        }

        let name = ArtifactName::generate(&image.file_name);
        self.artifacts.save(&name, &image.bytes).await?;
        self.metadata
            .save(&ArtifactMetadata::new(&name, sender_email, receiver_email))
            .await?;

        info!(
            filename = %name,
            sender = %sender_email,
            receiver = %receiver_email,
            size = image.bytes.len(),
            "Image uploaded"
        );

        Ok(UploadResponse {
            message: "Upload successful".to_string(),
            filename: name.to_string(),
        })
    }
}
