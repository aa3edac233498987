use anyhow::{bail, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use likefeed_server::config::{self, StoreBackend, StoreSettings};
use likefeed_server::kv_store::{InMemoryKvStore, KeyValueStore, SqliteKvStore};
use likefeed_server::provider::SpotifyClient;
use likefeed_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Public base URL of this server, used to build the login callback URL.
    #[clap(long, env = "APP_URL", default_value = "http://localhost:3001")]
    pub app_url: String,

    /// Client id registered with the music provider.
    #[clap(long, env = "SPOTIFY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Client secret registered with the music provider.
    #[clap(long, env = "SPOTIFY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Storage backend for users, hidden marks and comments.
    #[clap(long, value_enum, default_value_t = StoreBackend::Sqlite)]
    pub store: StoreBackend,

    /// Directory holding the SQLite store file. Required by the sqlite backend.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// Redis connection URL. Required by the redis backend.
    #[clap(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Timeout in seconds for each provider request.
    #[clap(long, default_value_t = 10)]
    pub provider_timeout_sec: u64,

    /// Timeout in seconds for the batched comment count query.
    #[clap(long, default_value_t = 5)]
    pub store_timeout_sec: u64,

    /// How many recently liked tracks to fetch per user (1-50).
    #[clap(long, default_value_t = 20)]
    pub liked_tracks_limit: u32,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            frontend_dir_path: args.frontend_dir_path.clone(),
            app_url: args.app_url.clone(),
            client_id: args.client_id.clone(),
            client_secret: args.client_secret.clone(),
            store: args.store,
            db_dir: args.db_dir.clone(),
            redis_url: args.redis_url.clone(),
            provider_timeout_sec: args.provider_timeout_sec,
            store_timeout_sec: args.store_timeout_sec,
            liked_tracks_limit: args.liked_tracks_limit,
        }
    }
}

fn open_store(settings: &StoreSettings) -> Result<Arc<dyn KeyValueStore>> {
    match settings {
        StoreSettings::Memory => {
            warn!("Using the in-memory store, nothing survives a restart");
            Ok(Arc::new(InMemoryKvStore::new()))
        }
        StoreSettings::Sqlite { db_path } => {
            info!("Opening SQLite store at {:?}...", db_path);
            Ok(Arc::new(SqliteKvStore::new(db_path)?))
        }
        #[cfg(feature = "redis")]
        StoreSettings::Redis { url } => {
            info!("Connecting to Redis store...");
            Ok(Arc::new(likefeed_server::kv_store::RedisKvStore::new(url)?))
        }
        #[cfg(not(feature = "redis"))]
        StoreSettings::Redis { .. } => {
            bail!("Redis store requested but the server was built without the `redis` feature")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  store: {:?}", app_config.store);
    info!("  port: {}", app_config.port);
    info!("  app_url: {}", app_config.app_url);
    info!("  liked_tracks_limit: {}", app_config.liked_tracks_limit);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let store = open_store(&app_config.store)?;
    if let Err(e) = store.ping().await {
        bail!("Store is not reachable: {}", e);
    }

    if !app_config.has_provider_credentials() {
        warn!("Provider client credentials are not set, logins and feed refreshes will fail");
    }
    let provider = Arc::new(SpotifyClient::new(
        app_config.client_id.clone(),
        app_config.client_secret.clone(),
        app_config.provider_endpoints.clone(),
        app_config.provider_timeout_sec,
    )?);

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        frontend_dir_path: app_config.frontend_dir_path.clone(),
        redirect_uri: app_config.redirect_uri(),
        provider_timeout_sec: app_config.provider_timeout_sec,
        store_timeout_sec: app_config.store_timeout_sec,
        liked_tracks_limit: app_config.liked_tracks_limit,
    };

    info!("Ready to serve at port {}!", app_config.port);
    info!("Metrics available at port {}!", app_config.metrics_port);
    run_server(server_config, store, provider, app_config.metrics_port).await
}
