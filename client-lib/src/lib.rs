pub mod api;
pub mod config;
pub mod count_cache;
pub mod feed;
pub mod model;
pub mod session;
pub mod session_store;
pub mod vote;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::{ApiError, ApiMethods, ReviewApi};
pub use config::Config;
pub use count_cache::CountCache;
pub use feed::{FeedSet, FeedState, LoadOutcome};
pub use model::{
    CountCacheEntry, FeedName, ReviewEntry, ReviewId, UserVote, VoteDirection,
};
pub use session::ReviewSession;
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use vote::{VoteOutcome, VoteReconciler};
