use anyhow::{Context, Result};
use std::time::Duration;

use axum::{extract::State, middleware, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use super::{
    log_requests, make_auth_routes, make_feed_routes, metrics::metrics_handler, state::*,
    ServerConfig,
};

#[derive(Serialize)]
struct StoreStatus {
    pub backend: &'static str,
    pub reachable: bool,
}

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub store: StoreStatus,
    pub provider_configured: bool,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn status(State(state): State<ServerState>) -> impl IntoResponse {
    let reachable = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Store ping failed");
            false
        }
    };
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        store: StoreStatus {
            backend: state.store.backend_name(),
            reachable,
        },
        provider_configured: state.provider.has_credentials(),
    })
}

pub fn make_app(
    config: ServerConfig,
    store: GuardedKvStore,
    provider: GuardedIdentityProvider,
    hash: String,
) -> Router {
    let state = ServerState::new(config.clone(), store, provider, hash);

    let api_routes: Router = Router::new()
        .route("/status", get(status))
        .with_state(state.clone())
        .merge(make_feed_routes(state.clone()))
        .merge(make_auth_routes(state.clone()));

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new(),
    };

    home_router
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    store: GuardedKvStore,
    provider: GuardedIdentityProvider,
    metrics_port: u16,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, store, provider, env!("GIT_HASH").to_string());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Serving on port {}, metrics on port {}", port, metrics_port);

    tokio::try_join!(
        async { axum::serve(listener, app).await },
        async { axum::serve(metrics_listener, make_metrics_app()).await },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv_store::InMemoryKvStore;
    use crate::provider::MockIdentityProvider;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let mut provider = MockIdentityProvider::new();
        provider.expect_has_credentials().return_const(false);
        make_app(
            ServerConfig::default(),
            Arc::new(InMemoryKvStore::new()),
            Arc::new(provider),
            "abc123".to_string(),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn uptime_format() {
        assert_eq!(format_uptime(Duration::from_secs(0)), "0d 00:00:00");
        assert_eq!(format_uptime(Duration::from_secs(90_061)), "1d 01:01:01");
    }

    #[tokio::test]
    async fn responds_unauthorized_on_protected_routes() {
        let app = app();
        let protected_routes = vec!["/api/hide", "/api/comment", "/api/delete-comment"];

        for route in protected_routes.into_iter() {
            let request = Request::builder()
                .method("POST")
                .uri(route)
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", route);
            assert_eq!(body_json(response).await["error"], "Not logged in");
        }
    }

    #[tokio::test]
    async fn status_reports_store_and_provider() {
        let request = Request::builder()
            .uri("/api/status")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["hash"], "abc123");
        assert_eq!(body["store"]["backend"], "memory");
        assert_eq!(body["store"]["reachable"], true);
        assert_eq!(body["provider_configured"], false);
    }

    #[tokio::test]
    async fn empty_feed_for_anonymous_viewer() {
        let request = Request::builder()
            .uri("/api/feed")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["songs"], serde_json::json!([]));
        assert_eq!(body["users"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn comments_require_both_query_params() {
        let request = Request::builder()
            .uri("/api/comments?trackId=t1")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"],
            "Missing trackId or likedBy"
        );
    }
}
