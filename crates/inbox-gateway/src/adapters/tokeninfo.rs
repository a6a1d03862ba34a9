//! Identity verification against an OAuth token-info endpoint.
//!
//! The endpoint validates the token signature and expiry; the claims it
//! returns are then checked against the configured audience and issuers.

use crate::domain::config::AuthConfig;
use crate::domain::error::GatewayError;
use crate::domain::types::Identity;
use crate::ports::outbound::{IdentityVerifier, SystemTimeSource, TimeSource, VerifyError};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::debug;

/// Claims returned by the token-info endpoint.
///
/// Numeric claims arrive as strings from Google, so both forms are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenInfoClaims {
    pub aud: Option<String>,
    pub iss: Option<String>,
    pub sub: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub exp: Option<u64>,
}

/// Verifier backed by a token-info HTTP endpoint.
pub struct TokenInfoVerifier {
    client: reqwest::Client,
    endpoint: String,
    audience: String,
    issuers: Vec<String>,
    clock: Arc<dyn TimeSource>,
}

impl TokenInfoVerifier {
    pub fn new(config: &AuthConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Verifier(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.tokeninfo_url.clone(),
            audience: config.client_id.clone(),
            issuers: config.allowed_issuers.clone(),
            clock: Arc::new(SystemTimeSource),
        })
    }

    /// Replace the clock used for expiry checks.
    pub fn with_time_source(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = clock;
        self
    }

    /// Check claims the endpoint vouched for against local policy.
    pub fn check_claims(&self, claims: TokenInfoClaims) -> Result<Identity, VerifyError> {
        match claims.aud.as_deref() {
            Some(aud) if aud == self.audience => {}
            other => {
                return Err(VerifyError::InvalidToken(format!(
                    "wrong audience: {:?}",
                    other
                )))
            }
        }

        match claims.iss.as_deref() {
            Some(iss) if self.issuers.iter().any(|allowed| allowed == iss) => {}
            other => {
                return Err(VerifyError::InvalidToken(format!(
                    "wrong issuer: {:?}",
                    other
                )))
            }
        }

        let now = self.clock.now();
        match claims.exp {
            Some(exp) if exp > now => {}
            Some(exp) => {
                return Err(VerifyError::InvalidToken(format!(
                    "token expired at {} (now {})",
                    exp, now
                )))
            }
            None => return Err(VerifyError::InvalidToken("missing exp claim".into())),
        }

        let subject_id = claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VerifyError::InvalidToken("missing sub claim".into()))?;
        let email = claims
            .email
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VerifyError::InvalidToken("missing email claim".into()))?;

        Ok(Identity { subject_id, email })
    }
}

#[async_trait]
impl IdentityVerifier for TokenInfoVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        let status = response.status();
        debug!(status = %status, "token-info response");

        if status.is_client_error() {
            return Err(VerifyError::InvalidToken(format!(
                "token rejected by identity provider ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(VerifyError::Unavailable(format!(
                "identity provider returned {}",
                status
            )));
        }

        let claims: TokenInfoClaims = response
            .json()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("unreadable token-info body: {}", e)))?;

        self.check_claims(claims)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}
