//! Feed and interaction routes.
//!
//! - `GET /feed`, `GET /users`
//! - `POST /hide`
//! - `POST /comment`, `GET /comments`, `POST /delete-comment`

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, warn};

use crate::feed::{Comment, FeedError, FeedKey, FeedResponse};
use crate::server::metrics::record_error;
use crate::server::session::Session;
use crate::server::state::ServerState;

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideBody {
    pub track_id: Option<String>,
    pub liked_by_user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub track_id: Option<String>,
    pub liked_by_user_id: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentBody {
    pub track_id: Option<String>,
    pub liked_by_user_id: Option<String>,
    pub index: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub track_id: Option<String>,
    pub liked_by: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub struct PostCommentResponse {
    pub ok: bool,
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
pub struct UserListing {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub connected_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserListing>,
}

// =============================================================================
// Helpers
// =============================================================================

fn ok_response() -> Response {
    Json(json!({ "ok": true })).into_response()
}

/// Turns a failed request into its JSON error, logging and counting it.
/// Store failures use `failure_message` instead of backend details.
fn failure(endpoint: &'static str, failure_message: &str, err: FeedError) -> Response {
    record_error(err.kind(), endpoint);
    match err {
        FeedError::StoreUnavailable(e) => {
            error!(endpoint, error = %e, "{}", failure_message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": failure_message })),
            )
                .into_response()
        }
        other => {
            warn!(endpoint, error = %other, "Request rejected");
            other.into_response()
        }
    }
}

/// Missing or unparseable bodies count as missing fields.
fn body_or_default<T: Default>(body: Result<Json<T>, JsonRejection>) -> T {
    match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection);
            T::default()
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn feed_key(
    track_id: Option<String>,
    liked_by: Option<String>,
    message: &str,
) -> Result<FeedKey, FeedError> {
    match (non_empty(track_id), non_empty(liked_by)) {
        (Some(track_id), Some(liked_by)) => Ok(FeedKey::new(&track_id, &liked_by)),
        _ => Err(FeedError::InvalidInput(message.to_string())),
    }
}

/// Accepts JSON integers only. Integers beyond `i64` are out of range anyway.
fn comment_index(value: Option<serde_json::Value>) -> Option<i64> {
    let value = value?;
    value
        .as_i64()
        .or_else(|| value.as_u64().map(|_| i64::MAX))
}

// =============================================================================
// Handlers
// =============================================================================

async fn get_feed(State(state): State<ServerState>, session: Option<Session>) -> Response {
    let viewer = session.as_ref().map(|s| s.user_id.as_str());
    match state.feed.build(viewer).await {
        Ok(feed) => Json::<FeedResponse>(feed).into_response(),
        Err(err) => failure("/api/feed", "Failed to load feed", err),
    }
}

async fn get_users(State(state): State<ServerState>) -> Response {
    match state.users.all().await {
        Ok(users) => Json(UsersResponse {
            users: users
                .into_iter()
                .map(|u| UserListing {
                    id: u.id,
                    name: u.name,
                    image: u.image,
                    connected_at: u.connected_at,
                })
                .collect(),
        })
        .into_response(),
        Err(err) => failure("/api/users", "Failed to load users", err.into()),
    }
}

async fn post_hide(
    State(state): State<ServerState>,
    session: Session,
    body: Result<Json<HideBody>, JsonRejection>,
) -> Response {
    let body = body_or_default(body);
    let result = async {
        let key = feed_key(
            body.track_id,
            body.liked_by_user_id,
            "Missing trackId or likedByUserId",
        )?;
        state.hidden.hide(&key, &session.user_id).await
    }
    .await;

    match result {
        Ok(()) => ok_response(),
        Err(err) => failure("/api/hide", "Failed to hide track", err),
    }
}

async fn post_comment(
    State(state): State<ServerState>,
    session: Session,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> Response {
    let body = body_or_default(body);
    let result = async {
        let key = feed_key(
            body.track_id,
            body.liked_by_user_id,
            "Missing required fields",
        )?;
        let text = non_empty(body.text)
            .ok_or_else(|| FeedError::InvalidInput("Missing required fields".to_string()))?;
        state.comments.post(&key, &session.user_id, &text).await
    }
    .await;

    match result {
        Ok(comment) => Json(PostCommentResponse { ok: true, comment }).into_response(),
        Err(err) => failure("/api/comment", "Failed to post comment", err),
    }
}

async fn get_comments(
    State(state): State<ServerState>,
    Query(query): Query<CommentsQuery>,
) -> Response {
    let result = async {
        let key = feed_key(query.track_id, query.liked_by, "Missing trackId or likedBy")?;
        state.comments.read_all(&key).await
    }
    .await;

    match result {
        Ok(comments) => Json(CommentsResponse { comments }).into_response(),
        Err(err) => failure("/api/comments", "Failed to load comments", err),
    }
}

async fn post_delete_comment(
    State(state): State<ServerState>,
    session: Session,
    body: Result<Json<DeleteCommentBody>, JsonRejection>,
) -> Response {
    let body = body_or_default(body);
    let result = async {
        let key = feed_key(
            body.track_id,
            body.liked_by_user_id,
            "Missing required fields",
        )?;
        let index = comment_index(body.index)
            .ok_or_else(|| FeedError::InvalidInput("Missing required fields".to_string()))?;
        state
            .comments
            .delete_at(&key, index, &session.user_id)
            .await
    }
    .await;

    match result {
        Ok(_) => ok_response(),
        Err(err) => failure("/api/delete-comment", "Failed to delete comment", err),
    }
}

pub fn make_feed_routes(state: ServerState) -> Router {
    Router::new()
        .route("/feed", get(get_feed))
        .route("/users", get(get_users))
        .route("/hide", post(post_hide))
        .route("/comment", post(post_comment))
        .route("/comments", get(get_comments))
        .route("/delete-comment", post(post_delete_comment))
        .with_state(state)
}
