//! Shared "liked songs" feed server.
//!
//! Users link their music account once; the server then merges everybody's
//! recently liked tracks into one timeline, lets the liker hide entries and
//! keeps a comment thread per feed entry.

pub mod auth;
pub mod config;
pub mod feed;
pub mod kv_store;
pub mod provider;
pub mod server;

// Re-export commonly used types for convenience
pub use feed::{FeedError, FeedResponse};
pub use kv_store::{InMemoryKvStore, KeyValueStore, SqliteKvStore, StoreError};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
