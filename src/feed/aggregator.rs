use super::comments::CommentCountAnnotator;
use super::error::FeedError;
use super::fetcher::{LikedItemFetcher, UserFetch};
use super::models::{FeedEntry, FeedResponse, User};
use super::users::UserDirectory;
use super::visibility::VisibilityFilter;
use crate::server::metrics;
use futures::future::join_all;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Builds the merged, filtered and annotated feed.
#[derive(Clone)]
pub struct FeedAggregator {
    users: UserDirectory,
    fetcher: LikedItemFetcher,
    visibility: VisibilityFilter,
    annotator: CommentCountAnnotator,
}

impl FeedAggregator {
    pub fn new(
        users: UserDirectory,
        fetcher: LikedItemFetcher,
        visibility: VisibilityFilter,
        annotator: CommentCountAnnotator,
    ) -> Self {
        Self {
            users,
            fetcher,
            visibility,
            annotator,
        }
    }

    /// Only a failed read of the user mapping, the hidden set or the comment
    /// counts fails the feed. Per-user upstream failures contribute nothing.
    pub async fn build(&self, viewer: Option<&str>) -> Result<FeedResponse, FeedError> {
        let started = Instant::now();
        let users = self.users.all().await?;
        if users.is_empty() {
            return Ok(FeedResponse::default());
        }

        debug!(viewer = viewer.unwrap_or("anonymous"), users = users.len(), "Building feed");

        let fetches = join_all(users.iter().map(|user| self.fetch_user(user))).await;
        let mut entries: Vec<FeedEntry> = fetches.into_iter().flatten().collect();
        // Stable: equal timestamps keep user-id then provider order.
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));

        let visible = self.visibility.apply(entries).await?;
        let songs = self.annotator.annotate(visible).await?;

        metrics::record_feed_built(songs.len(), started.elapsed());
        info!(
            users = users.len(),
            entries = songs.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Feed built"
        );

        Ok(FeedResponse {
            songs,
            users: users.iter().map(User::summary).collect(),
        })
    }

    /// One fan-out branch: fetch, then persist a rotated credential before
    /// handing the entries back.
    async fn fetch_user(&self, user: &User) -> Vec<FeedEntry> {
        let UserFetch {
            entries,
            rotated_refresh_token,
        } = self.fetcher.fetch(user).await;

        if let Some(refresh_token) = rotated_refresh_token {
            self.persist_rotation(user, refresh_token).await;
        }
        entries
    }

    /// Writes only the refresh token onto the record as it is stored now.
    /// A record removed or re-linked since the build started is left alone.
    async fn persist_rotation(&self, user: &User, refresh_token: String) {
        let current = match self.users.get(&user.id).await {
            Ok(Some(current)) if current.refresh_token == user.refresh_token => current,
            Ok(_) => {
                debug!(user_id = %user.id, "User record changed during build, dropping rotated credential");
                metrics::record_credential_rotation("skipped");
                return;
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to re-read user before persisting rotated credential");
                metrics::record_credential_rotation("failed");
                return;
            }
        };

        let updated = User {
            refresh_token,
            ..current
        };
        match self.users.upsert(&updated).await {
            Ok(()) => {
                info!(user_id = %user.id, "Persisted rotated refresh credential");
                metrics::record_credential_rotation("persisted");
            }
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to persist rotated refresh credential");
                metrics::record_credential_rotation("failed");
            }
        }
    }
}
