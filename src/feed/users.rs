use super::models::User;
use crate::kv_store::{KeyValueStore, StoreError};
use std::sync::Arc;
use tracing::warn;

/// Store key of the mapping holding every linked user.
pub const USERS_KEY: &str = "users";

/// Typed view over the `users` mapping.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<dyn KeyValueStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every parseable user, sorted by id. Malformed records are skipped.
    pub async fn all(&self) -> Result<Vec<User>, StoreError> {
        let raw = self.store.hash_get_all(USERS_KEY).await?;
        let mut users: Vec<User> = raw
            .into_iter()
            .filter_map(|(field, value)| match serde_json::from_str::<User>(&value) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(user_id = %field, error = %e, "Skipping malformed user record");
                    None
                }
            })
            .collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let Some(value) = self.store.hash_get(USERS_KEY, user_id).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&value) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!(user_id, error = %e, "Malformed user record");
                Ok(None)
            }
        }
    }

    /// Inserts or replaces the record stored under `user.id`.
    pub async fn upsert(&self, user: &User) -> Result<(), StoreError> {
        let value = serde_json::to_string(user)?;
        self.store.hash_set(USERS_KEY, &user.id, &value).await
    }
}
