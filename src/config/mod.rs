mod file_config;

pub use file_config::{FileConfig, ProviderConfig};

use crate::feed::MAX_LIKED_TRACKS_LIMIT;
use crate::provider::SpotifyEndpoints;
use crate::server::RequestsLoggingLevel;
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::fmt;
use std::path::PathBuf;

/// File name of the SQLite store inside `db_dir`.
pub const SQLITE_DB_FILE: &str = "likefeed.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
    Redis,
}

/// Resolved storage backend with its connection details.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreSettings {
    Memory,
    Sqlite { db_path: PathBuf },
    Redis { url: String },
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub app_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub store: StoreBackend,
    pub db_dir: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub provider_timeout_sec: u64,
    pub store_timeout_sec: u64,
    pub liked_tracks_limit: u32,
}

#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub app_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub store: StoreSettings,
    pub provider_timeout_sec: u64,
    pub store_timeout_sec: u64,
    pub liked_tracks_limit: u32,
    pub provider_endpoints: SpotifyEndpoints,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("metrics_port", &self.metrics_port)
            .field("logging_level", &self.logging_level)
            .field("frontend_dir_path", &self.frontend_dir_path)
            .field("app_url", &self.app_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("store", &self.store)
            .field("provider_timeout_sec", &self.provider_timeout_sec)
            .field("store_timeout_sec", &self.store_timeout_sec)
            .field("liked_tracks_limit", &self.liked_tracks_limit)
            .field("provider_endpoints", &self.provider_endpoints)
            .finish()
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let app_url = file
            .app_url
            .unwrap_or_else(|| cli.app_url.clone())
            .trim_end_matches('/')
            .to_string();
        if app_url.is_empty() {
            bail!("app_url must not be empty");
        }

        let client_id = file
            .client_id
            .or_else(|| cli.client_id.clone())
            .unwrap_or_default();
        let client_secret = file
            .client_secret
            .or_else(|| cli.client_secret.clone())
            .unwrap_or_default();

        let backend = match file.store {
            Some(s) => StoreBackend::from_str(&s, true)
                .map_err(|_| anyhow!("Unknown store backend in config file: {}", s))?,
            None => cli.store,
        };
        let store = match backend {
            StoreBackend::Memory => StoreSettings::Memory,
            StoreBackend::Sqlite => {
                let db_dir = file
                    .db_dir
                    .map(PathBuf::from)
                    .or_else(|| cli.db_dir.clone())
                    .ok_or_else(|| {
                        anyhow!("db_dir must be specified via --db-dir or in config file")
                    })?;
                if !db_dir.exists() {
                    bail!("Database directory does not exist: {:?}", db_dir);
                }
                if !db_dir.is_dir() {
                    bail!("db_dir is not a directory: {:?}", db_dir);
                }
                StoreSettings::Sqlite {
                    db_path: db_dir.join(SQLITE_DB_FILE),
                }
            }
            StoreBackend::Redis => {
                let url = file
                    .redis_url
                    .or_else(|| cli.redis_url.clone())
                    .ok_or_else(|| {
                        anyhow!("redis_url must be specified via --redis-url or in config file")
                    })?;
                StoreSettings::Redis { url }
            }
        };

        let provider_timeout_sec = file
            .provider_timeout_sec
            .unwrap_or(cli.provider_timeout_sec);
        let store_timeout_sec = file.store_timeout_sec.unwrap_or(cli.store_timeout_sec);
        let liked_tracks_limit = file
            .liked_tracks_limit
            .unwrap_or(cli.liked_tracks_limit)
            .clamp(1, MAX_LIKED_TRACKS_LIMIT);

        let defaults = SpotifyEndpoints::default();
        let provider_file = file.provider.unwrap_or_default();
        let provider_endpoints = SpotifyEndpoints {
            accounts_url: provider_file.accounts_url.unwrap_or(defaults.accounts_url),
            api_url: provider_file.api_url.unwrap_or(defaults.api_url),
        };

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            frontend_dir_path,
            app_url,
            client_id,
            client_secret,
            store,
            provider_timeout_sec,
            store_timeout_sec,
            liked_tracks_limit,
            provider_endpoints,
        })
    }

    /// Callback URL registered with the provider.
    pub fn redirect_uri(&self) -> String {
        format!("{}/api/callback", self.app_url)
    }

    pub fn has_provider_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
