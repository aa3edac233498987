use super::models::User;
use crate::provider::{IdentityProvider, ProviderError};
use crate::server::metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Short-lived access credential obtained from a stored refresh token.
#[derive(Clone, Debug, PartialEq)]
pub struct FreshCredential {
    pub access_token: String,
    pub expires_in: u64,
    /// New long-lived credential, set only when the provider rotated it.
    pub rotated_refresh_token: Option<String>,
}

/// Exchanges stored refresh tokens for access tokens.
///
/// Every failure (non-success status, transport error, timeout) collapses to
/// `None`; nothing escapes this boundary. Persisting a rotated token is up to
/// the caller.
#[derive(Clone)]
pub struct CredentialRefresher {
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
}

impl CredentialRefresher {
    pub fn new(provider: Arc<dyn IdentityProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub async fn refresh(&self, user: &User) -> Option<FreshCredential> {
        let result =
            match tokio::time::timeout(self.timeout, self.provider.refresh(&user.refresh_token))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout),
            };

        match result {
            Ok(grant) => {
                let rotated_refresh_token = grant
                    .refresh_token
                    .filter(|token| !token.is_empty() && *token != user.refresh_token);
                if rotated_refresh_token.is_some() {
                    debug!(user_id = %user.id, "Provider rotated refresh credential");
                }
                Some(FreshCredential {
                    access_token: grant.access_token,
                    expires_in: grant.expires_in,
                    rotated_refresh_token,
                })
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Token refresh failed");
                metrics::record_user_fetch_failure("refresh");
                None
            }
        }
    }
}
