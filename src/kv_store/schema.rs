//! SQLite schema for the key-value emulation tables.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection};

/// Offset added to the schema version stored in `PRAGMA user_version`, so a
/// random SQLite file is never mistaken for one of ours.
pub const BASE_DB_VERSION: usize = 99999;

pub struct KvSchema {
    pub version: usize,
    pub tables: &'static [(&'static str, &'static str)],
    pub indices: &'static [&'static str],
}

impl KvSchema {
    pub fn create(&self, conn: &Connection) -> Result<()> {
        for (name, columns) in self.tables {
            conn.execute(&format!("CREATE TABLE {} ({});", name, columns), params![])
                .with_context(|| format!("Failed to create table {}", name))?;
        }
        for index in self.indices {
            conn.execute(index, params![])?;
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + self.version),
            [],
        )?;
        Ok(())
    }

    /// Checks that every table of this schema exists.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        for (name, _) in self.tables {
            let exists: bool = conn
                .query_row(
                    "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1",
                    params![name],
                    |_| Ok(true),
                )
                .unwrap_or(false);
            if !exists {
                bail!("Table {} is missing", name);
            }
        }
        Ok(())
    }
}

pub const KV_VERSIONED_SCHEMAS: &[KvSchema] = &[KvSchema {
    version: 1,
    tables: &[
        (
            "kv_hash",
            "key TEXT NOT NULL, field TEXT NOT NULL, value TEXT NOT NULL, UNIQUE (key, field)",
        ),
        (
            "kv_set",
            "key TEXT NOT NULL, member TEXT NOT NULL, UNIQUE (key, member)",
        ),
        (
            "kv_list",
            "id INTEGER PRIMARY KEY, key TEXT NOT NULL, position INTEGER NOT NULL, value TEXT NOT NULL",
        ),
    ],
    indices: &["CREATE INDEX idx_kv_list_key_position ON kv_list(key, position);"],
}];
