use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::session::COOKIE_USER_KEY;
use super::state::{GuardedAccountLinker, ServerState};
use crate::auth::CallbackParams;
use crate::server::metrics::record_error;

/// Lifetime of the identity cookie.
const COOKIE_MAX_AGE_DAYS: i64 = 365;

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn user_cookie(value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((COOKIE_USER_KEY, value))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

async fn login(State(linker): State<GuardedAccountLinker>) -> Redirect {
    Redirect::to(&linker.begin().await)
}

async fn callback(
    State(linker): State<GuardedAccountLinker>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let params = CallbackParams {
        code: query.code,
        state: query.state,
        error: query.error,
    };

    match linker.complete(params).await {
        Ok(user) => {
            let cookie = user_cookie(
                urlencoding::encode(&user.id).into_owned(),
                time::Duration::days(COOKIE_MAX_AGE_DAYS),
            );
            (
                [(header::SET_COOKIE, cookie.to_string())],
                Redirect::to("/?connected=true"),
            )
                .into_response()
        }
        Err(err) => {
            warn!(error = %err, "Account link failed");
            record_error("link_failed", "/api/callback");
            let target = format!("/?error={}", urlencoding::encode(err.reason()));
            Redirect::to(&target).into_response()
        }
    }
}

async fn logout() -> Response {
    let cookie = user_cookie(String::new(), time::Duration::ZERO);
    info!("Clearing session cookie");
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "ok": true })),
    )
        .into_response()
}

pub fn make_auth_routes(state: ServerState) -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/callback", get(callback))
        .route("/logout", post(logout))
        .with_state(state)
}
