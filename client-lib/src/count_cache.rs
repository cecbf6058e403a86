use crate::api::ReviewApi;
use crate::model::{CountCacheEntry, ReviewId, VoteCount};
use ::futures::future::{BoxFuture, FutureExt, Shared};
use ::std::collections::{HashMap, HashSet};
use ::std::sync::Arc;
use ::tokio::sync::Mutex;

type PendingFetch = Shared<BoxFuture<'static, CountCacheEntry>>;

/// Comment and vote counts per review, shared by every feed for the
/// lifetime of the session. Entries are only dropped through
/// [`CountCache::invalidate`].
pub struct CountCache {
    api: Arc<dyn ReviewApi>,
    entries: Mutex<HashMap<ReviewId, CountCacheEntry>>,
    // Fetches already under way, joined by any caller asking for the same id.
    // Locked after `entries`, never before.
    pending: Mutex<HashMap<ReviewId, PendingFetch>>,
}

impl CountCache {
    pub fn new(api: Arc<dyn ReviewApi>) -> Self {
        CountCache {
            api,
            entries: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, review_id: ReviewId) -> Option<CountCacheEntry> {
        self.entries.lock().await.get(&review_id).copied()
    }

    /// Replaces whatever is cached for `review_id`.
    pub async fn store(&self, review_id: ReviewId, entry: CountCacheEntry) {
        self.entries.lock().await.insert(review_id, entry);
    }

    /// Reads and rewrites the entry for `review_id` under one lock, starting
    /// from zero counts when nothing is cached. Returns the new entry.
    pub async fn update<F>(
        &self,
        review_id: ReviewId,
        update: F,
    ) -> CountCacheEntry
    where
        F: FnOnce(&mut CountCacheEntry) + Send,
    {
        let mut entries = self.entries.lock().await;
        let entry = entries.entry(review_id).or_default();
        update(entry);
        *entry
    }

    pub async fn invalidate(
        &self,
        review_id: ReviewId,
    ) -> Option<CountCacheEntry> {
        self.entries.lock().await.remove(&review_id)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Cached entries for `review_ids`, skipping any that are absent.
    pub async fn snapshot(
        &self,
        review_ids: &[ReviewId],
    ) -> HashMap<ReviewId, CountCacheEntry> {
        let entries = self.entries.lock().await;
        review_ids
            .iter()
            .filter_map(|id| entries.get(id).map(|entry| (*id, *entry)))
            .collect()
    }

    /// Returns counts for every id, fetching only the ones not cached yet.
    /// An id another caller is already fetching is awaited, not refetched.
    /// Never fails: a count that cannot be fetched is cached as zero.
    pub async fn get_or_fetch(
        &self,
        review_ids: &[ReviewId],
    ) -> HashMap<ReviewId, CountCacheEntry> {
        let fetches: Vec<(ReviewId, PendingFetch)> = {
            let entries = self.entries.lock().await;
            let mut pending = self.pending.lock().await;
            let mut seen = HashSet::new();
            review_ids
                .iter()
                .copied()
                .filter(|id| !entries.contains_key(id) && seen.insert(*id))
                .map(|id| {
                    let fetch = pending
                        .entry(id)
                        .or_insert_with(|| {
                            fetch_entry(self.api.clone(), id).boxed().shared()
                        })
                        .clone();
                    (id, fetch)
                })
                .collect()
        };

        if !fetches.is_empty() {
            ::log::debug!("fetching counts for {} reviews", fetches.len());

            let fetched = ::futures::future::join_all(
                fetches
                    .into_iter()
                    .map(|(id, fetch)| async move { (id, fetch.await) }),
            )
            .await;

            let mut entries = self.entries.lock().await;
            let mut pending = self.pending.lock().await;
            for (review_id, entry) in fetched {
                // a vote confirmed while we were fetching is newer
                entries.entry(review_id).or_insert(entry);
                pending.remove(&review_id);
            }
        }

        self.snapshot(review_ids).await
    }
}

async fn fetch_entry(
    api: Arc<dyn ReviewApi>,
    review_id: ReviewId,
) -> CountCacheEntry {
    let (comment_count, vote_count) = ::futures::join!(
        api.comment_count(review_id),
        api.vote_count(review_id)
    );

    let comment_count = comment_count.unwrap_or_else(|err| {
        ::log::warn!(
            "failed to get comment count for review {}: {:#}",
            review_id,
            err
        );
        0
    });

    let vote_count = vote_count.unwrap_or_else(|err| {
        ::log::warn!(
            "failed to get vote count for review {}: {:#}",
            review_id,
            err
        );
        VoteCount::default()
    });

    CountCacheEntry::new(comment_count, &vote_count)
}
