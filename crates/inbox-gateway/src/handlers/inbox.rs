//! `list_inbox`: metadata records addressed to one email.

use super::InboxHandlers;
use crate::domain::error::{InboxError, InboxResult};
use crate::domain::types::{strip_bearer, ArtifactMetadata};
use tracing::{debug, warn};

impl InboxHandlers {
    /// Records whose receiver is exactly `email`, in store order.
    ///
    /// Unless inbox auth is enabled the caller is not authenticated at all:
    /// anyone may enumerate anyone's inbox. With it enabled, `authorization`
    /// must carry a token whose verified email equals `email`.
    pub async fn list_inbox(
        &self,
        email: &str,
        authorization: Option<&str>,
    ) -> InboxResult<Vec<ArtifactMetadata>> {
        if self.inbox_requires_auth {
            let identity = self.authenticate(authorization.map(strip_bearer)).await?;
            if identity.email != email {
                warn!(caller = %identity.email, inbox = %email, "Inbox listing denied");
                return Err(InboxError::InboxForbidden);
            }
        }

        let records = self.metadata.for_receiver(email).await?;
        debug!(inbox = %email, count = records.len(), "Inbox listed");
        Ok(records)
    }
}
