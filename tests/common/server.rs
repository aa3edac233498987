//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own SQLite store.

#![allow(dead_code)]

use super::constants::*;
use super::fixtures::FakeProvider;
use chrono::{DateTime, Utc};
use likefeed_server::feed::{User, UserDirectory};
use likefeed_server::kv_store::{KeyValueStore, SqliteKvStore};
use likefeed_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub fn user(id: &str, name: &str, refresh_token: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        image: None,
        refresh_token: refresh_token.to_string(),
        connected_at: DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .map(|d| d.with_timezone(&Utc))
            .expect("Invalid fixture date"),
    }
}

/// Alice and Bob with working credentials, Carol with a revoked one.
pub fn seeded_users() -> Vec<User> {
    vec![
        user(ALICE_ID, ALICE_NAME, ALICE_REFRESH_TOKEN),
        user(BOB_ID, BOB_NAME, BOB_REFRESH_TOKEN),
        user(CAROL_ID, CAROL_NAME, CAROL_REFRESH_TOKEN),
    ]
}

/// Test server instance with an isolated store
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Store shared with the server, for direct access in tests
    pub store: Arc<dyn KeyValueStore>,

    /// User directory over [`TestServer::store`]
    pub users: UserDirectory,

    /// The provider the server talks to
    pub provider: Arc<FakeProvider>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server with the seeded users and provider accounts.
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeProvider::seeded(), seeded_users()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Opens a SQLite store in a temporary directory
    /// 2. Stores the given users
    /// 3. Binds to a random port (127.0.0.1:0)
    /// 4. Spawns the server in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if the store cannot be created, the port cannot be bound or the
    /// server doesn't become ready within timeout.
    pub async fn spawn_with(provider: FakeProvider, users: Vec<User>) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let store: Arc<dyn KeyValueStore> = Arc::new(
            SqliteKvStore::new(temp_db_dir.path().join("likefeed.db"))
                .expect("Failed to open store"),
        );

        let directory = UserDirectory::new(store.clone());
        for user in &users {
            directory.upsert(user).await.expect("Failed to seed user");
        }

        let provider = Arc::new(provider);

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
            redirect_uri: format!("{}/api/callback", base_url),
            provider_timeout_sec: 2,
            store_timeout_sec: 2,
            liked_tracks_limit: 20,
        };

        let app = make_app(config, store.clone(), provider.clone(), "test".to_string());

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            users: directory,
            store,
            provider,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the status endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/api/status", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
