use super::RequestsLoggingLevel;
use crate::feed::DEFAULT_LIKED_TRACKS_LIMIT;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub frontend_dir_path: Option<String>,
    /// Callback URL registered with the identity provider.
    pub redirect_uri: String,
    pub provider_timeout_sec: u64,
    pub store_timeout_sec: u64,
    pub liked_tracks_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            frontend_dir_path: None,
            redirect_uri: "http://localhost:3001/api/callback".to_string(),
            provider_timeout_sec: 10,
            store_timeout_sec: 5,
            liked_tracks_limit: DEFAULT_LIKED_TRACKS_LIMIT,
        }
    }
}
