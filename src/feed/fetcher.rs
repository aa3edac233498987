use super::credentials::CredentialRefresher;
use super::error::FeedError;
use super::models::{FeedEntry, User};
use crate::provider::{IdentityProvider, ProviderError, ProviderSavedTrack};
use crate::server::metrics;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_LIKED_TRACKS_LIMIT: u32 = 20;
pub const MAX_LIKED_TRACKS_LIMIT: u32 = 50;

/// Result of fetching one user's likes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserFetch {
    /// Normalized entries in provider order (most recent first).
    pub entries: Vec<FeedEntry>,
    /// Set when the refresh rotated the user's long-lived credential, even if
    /// the listing itself failed afterwards.
    pub rotated_refresh_token: Option<String>,
}

/// Retrieves one user's recent likes as feed entries.
#[derive(Clone)]
pub struct LikedItemFetcher {
    refresher: CredentialRefresher,
    provider: Arc<dyn IdentityProvider>,
    timeout: Duration,
    limit: u32,
}

impl LikedItemFetcher {
    pub fn new(provider: Arc<dyn IdentityProvider>, timeout: Duration, limit: u32) -> Self {
        Self {
            refresher: CredentialRefresher::new(provider.clone(), timeout),
            provider,
            timeout,
            limit: limit.clamp(1, MAX_LIKED_TRACKS_LIMIT),
        }
    }

    /// Never fails: an unavailable credential or listing yields no entries.
    pub async fn fetch(&self, user: &User) -> UserFetch {
        let Some(credential) = self.refresher.refresh(user).await else {
            return UserFetch::default();
        };
        let rotated_refresh_token = credential.rotated_refresh_token;

        let items = match self.list_liked(&credential.access_token).await {
            Ok(items) => items,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Liked tracks fetch failed");
                metrics::record_user_fetch_failure("liked_items");
                return UserFetch {
                    entries: Vec::new(),
                    rotated_refresh_token,
                };
            }
        };

        let total = items.len();
        let entries: Vec<FeedEntry> = items
            .into_iter()
            .filter_map(|item| item.into_feed_entry(user.liked_by()))
            .collect();
        if entries.len() < total {
            debug!(
                user_id = %user.id,
                skipped = total - entries.len(),
                "Skipped liked items without a playable track"
            );
        }

        UserFetch {
            entries,
            rotated_refresh_token,
        }
    }

    async fn list_liked(&self, access_token: &str) -> Result<Vec<ProviderSavedTrack>, FeedError> {
        let result = match tokio::time::timeout(
            self.timeout,
            self.provider.liked_tracks(access_token, self.limit),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout),
        };
        result.map_err(|e| FeedError::UpstreamUnavailable(e.to_string()))
    }
}
