use super::error::FeedError;
use super::models::{FeedEntry, FeedKey};
use crate::kv_store::{KeyValueStore, StoreError};
use std::sync::Arc;
use tracing::info;

/// Store key of the set holding every hidden `trackId:likerId` member.
pub const HIDDEN_KEY: &str = "hidden";

/// Removes hidden entries from a feed, reading the hidden set once.
#[derive(Clone)]
pub struct VisibilityFilter {
    store: Arc<dyn KeyValueStore>,
}

impl VisibilityFilter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn apply(&self, entries: Vec<FeedEntry>) -> Result<Vec<FeedEntry>, StoreError> {
        let hidden = self.store.set_members(HIDDEN_KEY).await?;
        if hidden.is_empty() {
            return Ok(entries);
        }
        Ok(entries
            .into_iter()
            .filter(|entry| !hidden.contains(&entry.key().hidden_member()))
            .collect())
    }
}

/// Hide marks placed by likers on their own entries.
#[derive(Clone)]
pub struct HiddenSetManager {
    store: Arc<dyn KeyValueStore>,
}

impl HiddenSetManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Idempotent. Only the liker may hide an entry.
    pub async fn hide(&self, key: &FeedKey, requesting_user_id: &str) -> Result<(), FeedError> {
        if requesting_user_id != key.liker_id {
            return Err(FeedError::Forbidden(
                "You can only hide your own tracks".to_string(),
            ));
        }
        let added = self
            .store
            .set_add(HIDDEN_KEY, &key.hidden_member())
            .await?;
        if added {
            info!(track_id = %key.track_id, user_id = %key.liker_id, "Track hidden from feed");
        }
        Ok(())
    }

    pub async fn is_hidden(&self, key: &FeedKey) -> Result<bool, StoreError> {
        self.store
            .set_contains(HIDDEN_KEY, &key.hidden_member())
            .await
    }
}
