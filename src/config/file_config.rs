use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
    pub app_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    // Storage
    pub store: Option<String>,
    pub db_dir: Option<String>,
    pub redis_url: Option<String>,

    // Feed tuning
    pub provider_timeout_sec: Option<u64>,
    pub store_timeout_sec: Option<u64>,
    pub liked_tracks_limit: Option<u32>,

    pub provider: Option<ProviderConfig>,
}

/// `[provider]` section: base URLs of the identity provider.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub accounts_url: Option<String>,
    pub api_url: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
