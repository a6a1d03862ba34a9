//! `verify_token`: check a token and report who it belongs to.

use super::InboxHandlers;
use crate::domain::error::InboxResult;
use crate::domain::types::{VerifyTokenRequest, VerifyTokenResponse};
use tracing::debug;

impl InboxHandlers {
    /// Verify the first non-empty of `token` / `id_token`. No side effects.
    pub async fn verify_token(
        &self,
        request: VerifyTokenRequest,
    ) -> InboxResult<VerifyTokenResponse> {
        let identity = self.authenticate(request.token()).await?;
        debug!(email = %identity.email, "Token verified");

        Ok(VerifyTokenResponse {
            message: "Token is valid".to_string(),
            user_id: identity.subject_id,
            email: identity.email,
        })
    }
}
