use axum::extract::FromRef;

use crate::auth::AccountLinker;
use crate::feed::{
    CommentCountAnnotator, CommentLog, FeedAggregator, HiddenSetManager, LikedItemFetcher,
    UserDirectory, VisibilityFilter,
};
use crate::kv_store::KeyValueStore;
use crate::provider::IdentityProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::ServerConfig;

pub type GuardedKvStore = Arc<dyn KeyValueStore>;
pub type GuardedIdentityProvider = Arc<dyn IdentityProvider>;
pub type GuardedFeedAggregator = Arc<FeedAggregator>;
pub type GuardedAccountLinker = Arc<AccountLinker>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub store: GuardedKvStore,
    pub provider: GuardedIdentityProvider,
    pub users: UserDirectory,
    pub feed: GuardedFeedAggregator,
    pub comments: CommentLog,
    pub hidden: HiddenSetManager,
    pub account_linker: GuardedAccountLinker,
}

impl ServerState {
    /// Wires every feed component around one shared store and provider.
    pub fn new(
        config: ServerConfig,
        store: GuardedKvStore,
        provider: GuardedIdentityProvider,
        hash: String,
    ) -> Self {
        let provider_timeout = Duration::from_secs(config.provider_timeout_sec);
        let store_timeout = Duration::from_secs(config.store_timeout_sec);

        let users = UserDirectory::new(store.clone());
        let feed = FeedAggregator::new(
            users.clone(),
            LikedItemFetcher::new(
                provider.clone(),
                provider_timeout,
                config.liked_tracks_limit,
            ),
            VisibilityFilter::new(store.clone()),
            CommentCountAnnotator::new(store.clone(), store_timeout),
        );
        let account_linker = AccountLinker::new(
            provider.clone(),
            users.clone(),
            config.redirect_uri.clone(),
        );

        ServerState {
            start_time: Instant::now(),
            hash,
            comments: CommentLog::new(store.clone()),
            hidden: HiddenSetManager::new(store.clone()),
            feed: Arc::new(feed),
            account_linker: Arc::new(account_linker),
            users,
            store,
            provider,
            config,
        }
    }
}

impl FromRef<ServerState> for GuardedAccountLinker {
    fn from_ref(input: &ServerState) -> Self {
        input.account_linker.clone()
    }
}
