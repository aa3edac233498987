//! Test fixtures
//!
//! A scriptable in-process identity provider and helpers to build the
//! provider payloads it serves.

#![allow(dead_code)]

use super::constants::*;
use async_trait::async_trait;
use likefeed_server::provider::{
    IdentityProvider, ProviderError, ProviderProfile, ProviderSavedTrack, TokenGrant,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

/// Builds a liked-track item the way the provider's listing returns it.
pub fn saved_track(track_id: &str, name: &str, added_at: &str) -> ProviderSavedTrack {
    serde_json::from_value(json!({
        "added_at": added_at,
        "track": {
            "id": track_id,
            "name": name,
            "artists": [{ "id": "artist-1", "name": "The Test Band" }],
            "album": {
                "name": "First Album",
                "images": [{ "url": format!("https://img.test/{}.jpg", track_id) }]
            },
            "uri": format!("spotify:track:{}", track_id),
            "external_urls": { "spotify": format!("https://open.test/track/{}", track_id) }
        }
    }))
    .expect("Failed to build saved track")
}

#[derive(Clone)]
struct FakeAccount {
    access_token: String,
    profile: ProviderProfile,
    liked: Vec<ProviderSavedTrack>,
    listing_fails: bool,
}

#[derive(Default)]
struct FakeProviderState {
    /// Keyed by refresh token.
    accounts: HashMap<String, FakeAccount>,
    /// Authorization code -> refresh token.
    codes: HashMap<String, String>,
    /// Old refresh token -> rotated refresh token.
    rotations: HashMap<String, String>,
    refresh_calls: Vec<String>,
}

/// In-process stand-in for the music provider.
///
/// Refresh tokens that were never registered are rejected the way a revoked
/// credential is.
#[derive(Default)]
pub struct FakeProvider {
    state: Mutex<FakeProviderState>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alice and Bob with one liked track each, Carol revoked, and Dave
    /// ready to link through [`DAVE_AUTH_CODE`].
    pub fn seeded() -> Self {
        Self::new()
            .with_account(
                ALICE_REFRESH_TOKEN,
                ALICE_ID,
                ALICE_NAME,
                vec![saved_track(ALICE_TRACK_ID, "Opening Track", ALICE_TRACK_ADDED_AT)],
            )
            .with_account(
                BOB_REFRESH_TOKEN,
                BOB_ID,
                BOB_NAME,
                vec![saved_track(BOB_TRACK_ID, "Smooth Jazz", BOB_TRACK_ADDED_AT)],
            )
            .with_account(DAVE_REFRESH_TOKEN, DAVE_ID, DAVE_NAME, Vec::new())
            .with_code(DAVE_AUTH_CODE, DAVE_REFRESH_TOKEN)
    }

    pub fn with_account(
        self,
        refresh_token: &str,
        user_id: &str,
        display_name: &str,
        liked: Vec<ProviderSavedTrack>,
    ) -> Self {
        let account = FakeAccount {
            access_token: format!("access-{}", user_id),
            profile: ProviderProfile {
                id: user_id.to_string(),
                display_name: Some(display_name.to_string()),
                images: None,
            },
            liked,
            listing_fails: false,
        };
        self.lock().accounts.insert(refresh_token.to_string(), account);
        self
    }

    pub fn with_code(self, code: &str, refresh_token: &str) -> Self {
        self.lock()
            .codes
            .insert(code.to_string(), refresh_token.to_string());
        self
    }

    /// Refreshing `old` returns `new` as a rotated credential. `new` keeps
    /// working afterwards.
    pub fn with_rotation(self, old: &str, new: &str) -> Self {
        {
            let mut state = self.lock();
            if let Some(account) = state.accounts.get(old).cloned() {
                state.accounts.insert(new.to_string(), account);
            }
            state.rotations.insert(old.to_string(), new.to_string());
        }
        self
    }

    /// The liked-tracks listing of the account fails after a good refresh.
    pub fn with_failing_listing(self, refresh_token: &str) -> Self {
        if let Some(account) = self.lock().accounts.get_mut(refresh_token) {
            account.listing_fails = true;
        }
        self
    }

    /// Refresh tokens presented so far, in call order.
    pub fn refresh_calls(&self) -> Vec<String> {
        self.lock().refresh_calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeProviderState> {
        self.state.lock().expect("FakeProvider state poisoned")
    }

    fn grant(account: &FakeAccount, refresh_token: Option<String>) -> TokenGrant {
        TokenGrant {
            access_token: account.access_token.clone(),
            token_type: Some("Bearer".to_string()),
            expires_in: 3600,
            refresh_token,
            scope: None,
        }
    }

    fn invalid_grant() -> ProviderError {
        ProviderError::Api {
            status: 400,
            message: "invalid_grant".to_string(),
        }
    }

    fn account_by_access_token(&self, access_token: &str) -> Option<FakeAccount> {
        self.lock()
            .accounts
            .values()
            .find(|a| a.access_token == access_token)
            .cloned()
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn exchange_code(
        &self,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<TokenGrant, ProviderError> {
        let state = self.lock();
        let refresh_token = state.codes.get(code).ok_or_else(Self::invalid_grant)?;
        let account = state
            .accounts
            .get(refresh_token)
            .ok_or_else(Self::invalid_grant)?;
        Ok(Self::grant(account, Some(refresh_token.clone())))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        let mut state = self.lock();
        state.refresh_calls.push(refresh_token.to_string());
        let account = state
            .accounts
            .get(refresh_token)
            .ok_or_else(Self::invalid_grant)?;
        Ok(Self::grant(
            account,
            state.rotations.get(refresh_token).cloned(),
        ))
    }

    async fn profile(&self, access_token: &str) -> Result<ProviderProfile, ProviderError> {
        self.account_by_access_token(access_token)
            .map(|a| a.profile)
            .ok_or(ProviderError::Api {
                status: 401,
                message: "Invalid access token".to_string(),
            })
    }

    async fn liked_tracks(
        &self,
        access_token: &str,
        limit: u32,
    ) -> Result<Vec<ProviderSavedTrack>, ProviderError> {
        let account = self
            .account_by_access_token(access_token)
            .ok_or(ProviderError::Api {
                status: 401,
                message: "Invalid access token".to_string(),
            })?;
        if account.listing_fails {
            return Err(ProviderError::Api {
                status: 503,
                message: "Service unavailable".to_string(),
            });
        }
        Ok(account.liked.into_iter().take(limit as usize).collect())
    }

    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "{}?state={}&redirect_uri={}",
            FAKE_AUTHORIZE_URL,
            state,
            urlencoding::encode(redirect_uri)
        )
    }

    fn has_credentials(&self) -> bool {
        true
    }
}
