//! Shared constants for end-to-end tests
//!
//! When the seeded users or liked tracks change, update only this file.

#![allow(dead_code)]

// ============================================================================
// Seeded Users
// ============================================================================

pub const ALICE_ID: &str = "alice";
pub const ALICE_NAME: &str = "Alice";
pub const ALICE_REFRESH_TOKEN: &str = "alice-refresh";

pub const BOB_ID: &str = "bob";
pub const BOB_NAME: &str = "Bob";
pub const BOB_REFRESH_TOKEN: &str = "bob-refresh";

/// A user whose credential refresh is always rejected by the fake provider.
pub const CAROL_ID: &str = "carol";
pub const CAROL_NAME: &str = "Carol";
pub const CAROL_REFRESH_TOKEN: &str = "carol-revoked";

// ============================================================================
// Liked Tracks
// ============================================================================

/// Liked by Alice at [`ALICE_TRACK_ADDED_AT`].
pub const ALICE_TRACK_ID: &str = "track-a";
pub const ALICE_TRACK_ADDED_AT: &str = "2024-01-01T12:00:00Z";

/// Liked by Bob at [`BOB_TRACK_ADDED_AT`], the newest like.
pub const BOB_TRACK_ID: &str = "track-b";
pub const BOB_TRACK_ADDED_AT: &str = "2024-01-02T12:00:00Z";

// ============================================================================
// Account Linking
// ============================================================================

/// Authorization code the fake provider exchanges for Dave's credentials.
pub const DAVE_AUTH_CODE: &str = "dave-code";
pub const DAVE_ID: &str = "dave";
pub const DAVE_NAME: &str = "Dave";
pub const DAVE_REFRESH_TOKEN: &str = "dave-refresh";

pub const FAKE_AUTHORIZE_URL: &str = "https://accounts.test/authorize";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between server readiness checks (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Default timeout for HTTP requests in tests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
