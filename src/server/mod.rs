mod auth_routes;
pub mod config;
mod feed_routes;
mod http_layers;
pub mod metrics;
pub mod server;
pub mod session;
pub mod state;

pub(self) use auth_routes::make_auth_routes;
pub use config::ServerConfig;
pub(self) use feed_routes::make_feed_routes;
pub use http_layers::*;
pub use server::{make_app, run_server};
