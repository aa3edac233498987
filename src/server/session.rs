use crate::feed::FeedError;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use std::convert::Infallible;
use tracing::debug;

/// Cookie carrying the percent-encoded id of the linked user.
pub const COOKIE_USER_KEY: &str = "rf_user";

/// Identity of the caller, taken from the `rf_user` cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user_id: String,
}

fn extract_session_from_request_parts(parts: &Parts) -> Option<Session> {
    let jar = CookieJar::from_headers(&parts.headers);
    let raw = jar.get(COOKIE_USER_KEY)?.value().to_string();
    let user_id = match urlencoding::decode(&raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            debug!("Could not decode {} cookie: {}", COOKIE_USER_KEY, e);
            return None;
        }
    };
    if user_id.is_empty() {
        return None;
    }
    Some(Session { user_id })
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = FeedError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        extract_session_from_request_parts(parts).ok_or(FeedError::Unauthenticated)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(extract_session_from_request_parts(parts))
    }
}
