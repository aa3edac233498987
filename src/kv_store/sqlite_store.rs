use super::schema::{BASE_DB_VERSION, KV_VERSIONED_SCHEMAS};
use super::{KeyValueStore, StoreError};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

/// Key-value store persisted in a single SQLite file.
///
/// Lists are stored as rows carrying an integer `position`; pushing to the
/// front takes `MIN(position) - 1`, so reading ordered by position yields the
/// newest value first.
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let is_new_db = !path.exists();

        let conn = Connection::open(path).context("Failed to open key-value database")?;

        if is_new_db {
            info!("Creating new key-value database at {:?}", path);
            Self::latest_schema()?.create(&conn)?;
        } else {
            let raw_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
            let db_version = raw_version - BASE_DB_VERSION as i64;

            if db_version < 1 {
                anyhow::bail!(
                    "Key-value database version {} is invalid (expected >= 1)",
                    db_version
                );
            }

            let schema = KV_VERSIONED_SCHEMAS
                .iter()
                .find(|s| s.version == db_version as usize)
                .with_context(|| format!("Unknown key-value database version {}", db_version))?;
            schema.validate(&conn).with_context(|| {
                format!(
                    "Key-value database schema validation failed for version {}",
                    db_version
                )
            })?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn latest_schema() -> Result<&'static super::schema::KvSchema> {
        KV_VERSIONED_SCHEMAS
            .last()
            .context("No key-value schema defined")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("SQLite connection lock poisoned".to_string()))
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT field, value FROM kv_hash WHERE key = ?1")?;
        let rows = stmt.query_map(params![key], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = HashMap::new();
        for row in rows {
            let (field, value): (String, String) = row?;
            out.insert(field, value);
        }
        Ok(out)
    }

    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_hash WHERE key = ?1 AND field = ?2",
                params![key, field],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO kv_hash (key, field, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(key, field) DO UPDATE SET value = excluded.value",
            params![key, field, value],
        )?;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO kv_set (key, member) VALUES (?1, ?2)",
            params![key, member],
        )?;
        Ok(inserted > 0)
    }

    async fn set_members(&self, key: &str) -> Result<HashSet<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT member FROM kv_set WHERE key = ?1")?;
        let members = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<rusqlite::Result<HashSet<String>>>()?;
        Ok(members)
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM kv_set WHERE key = ?1 AND member = ?2",
                params![key, member],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn list_push_front(&self, key: &str, value: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO kv_list (key, position, value)
             VALUES (?1, COALESCE((SELECT MIN(position) FROM kv_list WHERE key = ?1), 0) - 1, ?2)",
            params![key, value],
        )?;
        let len: i64 = tx.query_row(
            "SELECT COUNT(*) FROM kv_list WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(len as u64)
    }

    async fn list_range_all(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT value FROM kv_list WHERE key = ?1 ORDER BY position ASC")?;
        let values = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(values)
    }

    async fn list_replace(&self, key: &str, values: Vec<String>) -> Result<(), StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM kv_list WHERE key = ?1", params![key])?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO kv_list (key, position, value) VALUES (?1, ?2, ?3)")?;
            for (position, value) in values.iter().enumerate() {
                stmt.execute(params![key, position as i64, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn list_lengths(&self, keys: &[String]) -> Result<Vec<u64>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut lengths = Vec::with_capacity(keys.len());
        {
            let mut stmt = tx.prepare("SELECT COUNT(*) FROM kv_list WHERE key = ?1")?;
            for key in keys {
                let len: i64 = stmt.query_row(params![key], |row| row.get(0))?;
                lengths.push(len as u64);
            }
        }
        tx.commit()?;
        Ok(lengths)
    }
}
