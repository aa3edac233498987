use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, Histogram, HistogramOpts, HistogramVec, IntCounter, Opts,
    Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all likefeed metrics
const PREFIX: &str = "likefeed";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Feed Metrics
    pub static ref FEED_USER_FETCH_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_feed_user_fetch_failures_total"),
            "Per-user fetch failures during feed aggregation"
        ),
        &["stage"]
    ).expect("Failed to create feed_user_fetch_failures_total metric");

    pub static ref FEED_COMMENT_COUNT_FAILURES_TOTAL: IntCounter = IntCounter::new(
        format!("{PREFIX}_feed_comment_count_failures_total"),
        "Failed comment-count batches"
    ).expect("Failed to create feed_comment_count_failures_total metric");

    pub static ref CREDENTIAL_ROTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_credential_rotations_total"),
            "Rotated refresh credentials by persistence outcome"
        ),
        &["outcome"]
    ).expect("Failed to create credential_rotations_total metric");

    pub static ref FEED_BUILD_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_feed_build_duration_seconds"),
            "Time to build a complete feed response"
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0])
    ).expect("Failed to create feed_build_duration_seconds metric");

    pub static ref FEED_ENTRIES: Gauge = Gauge::new(
        format!("{PREFIX}_feed_entries"),
        "Number of entries in the last built feed"
    ).expect("Failed to create feed_entries metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Ignore errors if already registered (tests call this repeatedly)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(FEED_USER_FETCH_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(FEED_COMMENT_COUNT_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CREDENTIAL_ROTATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(FEED_BUILD_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(FEED_ENTRIES.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a per-user fetch failure. `stage` is `refresh` or `liked_items`.
pub fn record_user_fetch_failure(stage: &str) {
    FEED_USER_FETCH_FAILURES_TOTAL
        .with_label_values(&[stage])
        .inc();
}

pub fn record_comment_count_failure() {
    FEED_COMMENT_COUNT_FAILURES_TOTAL.inc();
}

/// Record a rotated refresh credential. `outcome` is `persisted` or `failed`.
pub fn record_credential_rotation(outcome: &str) {
    CREDENTIAL_ROTATIONS_TOTAL
        .with_label_values(&[outcome])
        .inc();
}

pub fn record_feed_built(entries: usize, duration: Duration) {
    FEED_ENTRIES.set(entries as f64);
    FEED_BUILD_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record an error
pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Collapse request paths into a bounded label set.
pub fn categorize_endpoint(path: &str) -> &'static str {
    match path {
        "/api/feed" => "/api/feed",
        "/api/users" => "/api/users",
        "/api/hide" => "/api/hide",
        "/api/comment" => "/api/comment",
        "/api/comments" => "/api/comments",
        "/api/delete-comment" => "/api/delete-comment",
        "/api/login" => "/api/login",
        "/api/callback" => "/api/callback",
        "/api/logout" => "/api/logout",
        "/api/status" => "/api/status",
        p if p.starts_with("/api/") => "/api/other",
        _ => "static",
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
