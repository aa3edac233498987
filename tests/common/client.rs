//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint. Redirects are never
//! followed so the login handshake can be inspected step by step.
//!
//! When API routes or request formats change, update only this file.

#![allow(dead_code)]

use super::constants::*;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{redirect, Response};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP test client with cookie-based identity
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates an anonymous client that keeps the cookies the server sets.
    ///
    /// Use this for testing the login handshake.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client identified as `user_id` through the `rf_user` cookie.
    pub fn as_user(base_url: String, user_id: &str) -> Self {
        let mut headers = HeaderMap::new();
        let cookie = format!("rf_user={}", urlencoding::encode(user_id));
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&cookie).expect("Invalid cookie header"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> Response {
        self.client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap_or_else(|e| panic!("POST {} failed: {}", path, e))
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {} failed: {}", path, e))
    }

    // ========================================================================
    // Account Linking
    // ========================================================================

    /// GET /api/login
    pub async fn login(&self) -> Response {
        self.get("/api/login").await
    }

    /// GET /api/callback with the given query parameters
    pub async fn callback(&self, params: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/api/callback"))
            .query(params)
            .send()
            .await
            .expect("Callback request failed")
    }

    /// POST /api/logout
    pub async fn logout(&self) -> Response {
        self.client
            .post(self.url("/api/logout"))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /api/status
    pub async fn status(&self) -> Response {
        self.get("/api/status").await
    }

    // ========================================================================
    // Feed
    // ========================================================================

    /// GET /api/feed
    pub async fn get_feed(&self) -> Response {
        self.get("/api/feed").await
    }

    /// GET /api/feed, asserting success and returning the body
    pub async fn feed_json(&self) -> Value {
        let response = self.get_feed().await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Feed is not JSON")
    }

    /// GET /api/users
    pub async fn get_users(&self) -> Response {
        self.get("/api/users").await
    }

    /// POST /api/hide
    pub async fn hide(&self, track_id: &str, liked_by_user_id: &str) -> Response {
        self.post_json(
            "/api/hide",
            json!({ "trackId": track_id, "likedByUserId": liked_by_user_id }),
        )
        .await
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// POST /api/comment
    pub async fn post_comment(&self, track_id: &str, liked_by_user_id: &str, text: &str) -> Response {
        self.post_json(
            "/api/comment",
            json!({ "trackId": track_id, "likedByUserId": liked_by_user_id, "text": text }),
        )
        .await
    }

    /// GET /api/comments
    pub async fn get_comments(&self, track_id: &str, liked_by: &str) -> Response {
        self.client
            .get(self.url("/api/comments"))
            .query(&[("trackId", track_id), ("likedBy", liked_by)])
            .send()
            .await
            .expect("Comments request failed")
    }

    /// POST /api/delete-comment
    pub async fn delete_comment(
        &self,
        track_id: &str,
        liked_by_user_id: &str,
        index: Value,
    ) -> Response {
        self.post_json(
            "/api/delete-comment",
            json!({ "trackId": track_id, "likedByUserId": liked_by_user_id, "index": index }),
        )
        .await
    }

    /// POST with an arbitrary JSON body, for malformed-request tests
    pub async fn post_raw(&self, path: &str, body: Value) -> Response {
        self.post_json(path, body).await
    }
}
