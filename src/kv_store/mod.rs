//! Key-value persistence used by the feed components.
//!
//! The feed only needs a handful of primitives: a hash map (the `users`
//! mapping), a set (hidden marks) and ordered lists (comment logs), plus a
//! batched length query. Every backend implements [`KeyValueStore`] and is
//! injected as an `Arc<dyn KeyValueStore>`.

mod memory;
#[cfg(feature = "redis")]
mod redis_store;
mod schema;
mod sqlite_store;

pub use memory::InMemoryKvStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisKvStore;
pub use sqlite_store::SqliteKvStore;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors raised by a key-value backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Stored value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store request timed out")]
    Timeout,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Minimal set of store primitives.
///
/// Lists follow the "push to front" orientation: index 0 is the most recently
/// pushed value.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Short name of the backend, reported by the status endpoint.
    fn backend_name(&self) -> &'static str;

    /// Round trip to the backend without touching data.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// Returns true if the member was not already present.
    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError>;

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Pushes a value to the front of the list, returning the new length.
    async fn list_push_front(&self, key: &str, value: &str) -> Result<u64, StoreError>;

    /// Every value of the list, front to back.
    async fn list_range_all(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Atomically replaces the whole list with `values` (front to back).
    /// An empty `values` removes the key.
    async fn list_replace(&self, key: &str, values: Vec<String>) -> Result<(), StoreError>;

    /// Length of every list in `keys`, in one round trip. Missing keys have
    /// length 0. The result is positionally aligned with `keys`.
    async fn list_lengths(&self, keys: &[String]) -> Result<Vec<u64>, StoreError>;
}
