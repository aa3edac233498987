//! Account linking through the provider's authorization-code flow.

use crate::feed::{User, UserDirectory};
use crate::kv_store::StoreError;
use crate::provider::{IdentityProvider, ProviderError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Seconds an issued state stays valid.
const STATE_TTL_SECS: i64 = 300;

/// CSRF state of a login in progress.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub csrf_token: String,
    pub created_at: i64,
}

impl AuthState {
    fn is_expired(&self, now: i64) -> bool {
        now - self.created_at >= STATE_TTL_SECS
    }
}

/// In-memory store for pending authorization states.
pub struct AuthStateStore {
    states: RwLock<HashMap<String, AuthState>>,
}

impl AuthStateStore {
    pub fn new() -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
        }
    }

    /// Creates, stores and returns a fresh CSRF token.
    pub async fn issue(&self) -> String {
        self.cleanup_expired().await;
        let state = AuthState {
            csrf_token: uuid::Uuid::new_v4().simple().to_string(),
            created_at: Utc::now().timestamp(),
        };
        let token = state.csrf_token.clone();
        self.store(state).await;
        token
    }

    /// Store an auth state, keyed by the CSRF token
    pub async fn store(&self, state: AuthState) {
        let key = state.csrf_token.clone();
        let mut states = self.states.write().await;
        states.insert(key, state);
    }

    /// Retrieve and remove a still valid auth state by CSRF token
    pub async fn take(&self, csrf_token: &str) -> Option<AuthState> {
        let mut states = self.states.write().await;
        states
            .remove(csrf_token)
            .filter(|state| !state.is_expired(Utc::now().timestamp()))
    }

    /// Clean up expired states (older than 5 minutes)
    pub async fn cleanup_expired(&self) {
        let now = Utc::now().timestamp();
        let mut states = self.states.write().await;
        states.retain(|_, state| !state.is_expired(now));
    }
}

impl Default for AuthStateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Reasons a callback can fail. [`LinkError::reason`] is the value sent back
/// to the browser in `/?error=`.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Provider returned error: {0}")]
    Denied(String),

    #[error("No authorization code")]
    NoCode,

    #[error("Unknown or expired state")]
    InvalidState,

    #[error("Token exchange failed: {0}")]
    TokenFailed(String),

    #[error("Profile fetch failed: {0}")]
    ProfileFailed(#[source] ProviderError),

    #[error("Failed to store user: {0}")]
    Store(#[from] StoreError),
}

impl LinkError {
    pub fn reason(&self) -> &str {
        match self {
            LinkError::Denied(error) => error,
            LinkError::NoCode => "no_code",
            LinkError::InvalidState => "invalid_state",
            LinkError::TokenFailed(_) => "token_failed",
            LinkError::ProfileFailed(_) => "profile_failed",
            LinkError::Store(_) => "server_error",
        }
    }
}

/// Query parameters of the provider callback.
#[derive(Debug, Default, Clone)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Runs the login handshake and records linked users.
pub struct AccountLinker {
    provider: Arc<dyn IdentityProvider>,
    users: UserDirectory,
    states: AuthStateStore,
    redirect_uri: String,
}

impl AccountLinker {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        users: UserDirectory,
        redirect_uri: String,
    ) -> Self {
        Self {
            provider,
            users,
            states: AuthStateStore::new(),
            redirect_uri,
        }
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Provider URL that starts a new login.
    pub async fn begin(&self) -> String {
        let state = self.states.issue().await;
        self.provider.authorize_url(&state, &self.redirect_uri)
    }

    /// Completes a login: validates the state, exchanges the code, reads the
    /// profile and upserts the user record.
    pub async fn complete(&self, params: CallbackParams) -> Result<User, LinkError> {
        if let Some(error) = params.error.filter(|e| !e.is_empty()) {
            return Err(LinkError::Denied(error));
        }
        let code = params
            .code
            .filter(|c| !c.is_empty())
            .ok_or(LinkError::NoCode)?;
        let state = params.state.unwrap_or_default();
        if self.states.take(&state).await.is_none() {
            return Err(LinkError::InvalidState);
        }

        let grant = self
            .provider
            .exchange_code(&code, &self.redirect_uri)
            .await
            .map_err(|e| LinkError::TokenFailed(e.to_string()))?;
        let refresh_token = grant
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LinkError::TokenFailed("grant has no refresh token".to_string()))?;

        let profile = self
            .provider
            .profile(&grant.access_token)
            .await
            .map_err(LinkError::ProfileFailed)?;

        let user = User {
            name: profile.name(),
            image: profile.avatar_url(),
            id: profile.id,
            refresh_token,
            connected_at: Utc::now(),
        };
        self.users.upsert(&user).await.map_err(|e| {
            warn!(user_id = %user.id, error = %e, "Failed to store linked user");
            LinkError::from(e)
        })?;

        info!(user_id = %user.id, "Linked account");
        Ok(user)
    }
}
