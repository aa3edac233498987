//! Feed aggregation and the interaction store.
//!
//! [`FeedAggregator`] fans out over every linked user, merges their likes
//! into one timeline, drops hidden entries and annotates comment counts.
//! [`CommentLog`] and [`HiddenSetManager`] back the interactive actions.

mod aggregator;
mod comments;
mod credentials;
mod error;
mod fetcher;
mod models;
mod users;
mod visibility;

pub use aggregator::FeedAggregator;
pub use comments::{validate_comment_text, CommentCountAnnotator, CommentLog, MAX_COMMENT_CHARS};
pub use credentials::{CredentialRefresher, FreshCredential};
pub use error::FeedError;
pub use fetcher::{LikedItemFetcher, UserFetch, DEFAULT_LIKED_TRACKS_LIMIT, MAX_LIKED_TRACKS_LIMIT};
pub use models::{
    AlbumRef, Comment, FeedEntry, FeedKey, FeedResponse, LikedBy, Track, User, UserSummary,
};
pub use users::{UserDirectory, USERS_KEY};
pub use visibility::{HiddenSetManager, VisibilityFilter, HIDDEN_KEY};
