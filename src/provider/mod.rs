//! External identity provider and music catalog.
//!
//! The provider issues delegated credentials through the OAuth 2
//! authorization-code flow and serves the profile and "liked tracks"
//! listings the feed is built from.

mod models;
mod spotify;

pub use models::{
    ProviderAlbum, ProviderArtist, ProviderExternalUrls, ProviderImage, ProviderProfile,
    ProviderSavedTrack, ProviderTrack, SavedTracksPage, TokenGrant,
};
pub use spotify::{SpotifyClient, SpotifyEndpoints};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Operations the feed and the account-link handshake need from the
/// provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges an authorization code for a credential grant.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenGrant, ProviderError>;

    /// Exchanges a long-lived refresh credential for a fresh access token.
    /// The grant carries a new refresh token when the provider rotated it.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError>;

    async fn profile(&self, access_token: &str) -> Result<ProviderProfile, ProviderError>;

    /// Most recently liked tracks first, at most `limit` items.
    async fn liked_tracks(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<ProviderSavedTrack>, ProviderError>;

    /// URL the browser is sent to in order to start the authorization flow.
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Whether client credentials are configured at all.
    fn has_credentials(&self) -> bool;
}
