use super::error::FeedError;
use super::models::{Comment, FeedEntry, FeedKey};
use super::users::UserDirectory;
use crate::kv_store::{KeyValueStore, StoreError};
use crate::server::metrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Maximum comment length, in Unicode scalar values.
pub const MAX_COMMENT_CHARS: usize = 280;

/// Trims `text` and checks it is non-empty and at most
/// [`MAX_COMMENT_CHARS`] long.
pub fn validate_comment_text(text: &str) -> Result<String, FeedError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(FeedError::InvalidInput(
            "Missing required fields".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_CHARS {
        return Err(FeedError::InvalidInput("Comment too long".to_string()));
    }
    Ok(trimmed.to_string())
}

fn parse_comment(raw: &str) -> Result<Comment, FeedError> {
    serde_json::from_str(raw).map_err(|e| FeedError::StoreUnavailable(StoreError::from(e)))
}

/// Per-entry comment threads.
///
/// The backing list is kept newest-first (push to front); every read is
/// reversed so callers always see the oldest comment at index 0.
#[derive(Clone)]
pub struct CommentLog {
    store: Arc<dyn KeyValueStore>,
    users: UserDirectory,
}

impl CommentLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            users: UserDirectory::new(store.clone()),
            store,
        }
    }

    pub async fn append(&self, key: &FeedKey, comment: &Comment) -> Result<(), FeedError> {
        let value = serde_json::to_string(comment).map_err(StoreError::from)?;
        self.store
            .list_push_front(&key.comments_key(), &value)
            .await?;
        Ok(())
    }

    /// Every comment of the thread, oldest first.
    pub async fn read_all(&self, key: &FeedKey) -> Result<Vec<Comment>, FeedError> {
        let raw = self.store.list_range_all(&key.comments_key()).await?;
        raw.iter().rev().map(|value| parse_comment(value)).collect()
    }

    /// Removes the comment at `index` of the oldest-first view.
    ///
    /// Reads the whole thread and writes back the survivors in one replace;
    /// a comment appended between the two steps is lost.
    pub async fn delete_at(
        &self,
        key: &FeedKey,
        index: i64,
        requesting_user_id: &str,
    ) -> Result<Comment, FeedError> {
        let list_key = key.comments_key();
        let mut raw = self.store.list_range_all(&list_key).await?;
        raw.reverse();

        let comments = raw
            .iter()
            .map(|value| parse_comment(value))
            .collect::<Result<Vec<_>, _>>()?;

        let position = usize::try_from(index)
            .ok()
            .filter(|i| *i < comments.len())
            .ok_or_else(|| FeedError::NotFound("Invalid comment index".to_string()))?;

        let target = &comments[position];
        if target.user_id != requesting_user_id {
            return Err(FeedError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }
        let removed = target.clone();

        raw.remove(position);
        raw.reverse();
        self.store.list_replace(&list_key, raw).await?;

        info!(
            track_id = %key.track_id,
            liker_id = %key.liker_id,
            user_id = requesting_user_id,
            "Comment deleted"
        );
        Ok(removed)
    }

    /// Validates `text`, resolves the author's display name and appends the
    /// new comment.
    pub async fn post(
        &self,
        key: &FeedKey,
        author_id: &str,
        text: &str,
    ) -> Result<Comment, FeedError> {
        let text = validate_comment_text(text)?;
        let user_name = self
            .users
            .get(author_id)
            .await?
            .map(|user| user.name)
            .unwrap_or_else(|| author_id.to_string());

        let comment = Comment {
            user_id: author_id.to_string(),
            user_name,
            text,
            timestamp: Utc::now(),
        };
        self.append(key, &comment).await?;
        Ok(comment)
    }
}

/// Sets `comment_count` on every entry with one batched length query.
#[derive(Clone)]
pub struct CommentCountAnnotator {
    store: Arc<dyn KeyValueStore>,
    timeout: Duration,
}

impl CommentCountAnnotator {
    pub fn new(store: Arc<dyn KeyValueStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// All-or-nothing: a failed batch fails the whole annotation.
    pub async fn annotate(&self, mut entries: Vec<FeedEntry>) -> Result<Vec<FeedEntry>, FeedError> {
        if entries.is_empty() {
            return Ok(entries);
        }
        let keys: Vec<String> = entries.iter().map(|e| e.key().comments_key()).collect();

        let result = match tokio::time::timeout(self.timeout, self.store.list_lengths(&keys)).await
        {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout),
        };
        let counts = match result {
            Ok(counts) if counts.len() == entries.len() => counts,
            Ok(counts) => {
                return Err(self.failed(StoreError::Backend(format!(
                    "Expected {} comment counts, got {}",
                    entries.len(),
                    counts.len()
                ))))
            }
            Err(e) => return Err(self.failed(e)),
        };

        for (entry, count) in entries.iter_mut().zip(counts) {
            entry.comment_count = count;
        }
        Ok(entries)
    }

    fn failed(&self, error: StoreError) -> FeedError {
        warn!(error = %error, "Comment count batch failed");
        metrics::record_comment_count_failure();
        FeedError::StoreUnavailable(error)
    }
}
