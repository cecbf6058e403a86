use crate::api::{error::is_end_of_data, ReviewApi};
use crate::count_cache::CountCache;
use crate::model::{
    CountCacheEntry, FeedName, ReviewEntry, ReviewId, ReviewRecord, PAGE_SIZE,
};
use ::anyhow::Result;
use ::std::collections::HashMap;
use ::std::sync::Arc;
use ::tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    pub entries: Vec<ReviewEntry>,
    /// Next page to request, starting at 1.
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    /// A page request has been started since the last reset.
    pub loaded: bool,
    pub invalidated: bool,
    // Bumped on every reset so a page that was in flight is dropped.
    generation: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        FeedState {
            entries: Vec::new(),
            page: 1,
            has_more: true,
            loading: false,
            loaded: false,
            invalidated: false,
            generation: 0,
        }
    }
}

impl FeedState {
    fn reset(&mut self) {
        self.entries.clear();
        self.page = 1;
        self.has_more = true;
        self.loaded = false;
        self.invalidated = false;
        self.generation += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fetch was already in flight or the feed has no more pages.
    Skipped,
    Loaded { added: usize, has_more: bool },
    /// The server signalled there are no more pages.
    Exhausted,
}

/// Paginated review feeds joined with the shared [`CountCache`]. Each feed
/// keeps its own cursor so switching between feeds does not refetch.
pub struct FeedSet {
    api: Arc<dyn ReviewApi>,
    counts: Arc<CountCache>,
    feeds: Mutex<HashMap<FeedName, FeedState>>,
    active: Mutex<Option<FeedName>>,
}

impl FeedSet {
    pub fn new(api: Arc<dyn ReviewApi>, counts: Arc<CountCache>) -> Self {
        FeedSet {
            api,
            counts,
            feeds: Mutex::new(
                FeedName::ALL
                    .iter()
                    .map(|feed| (*feed, FeedState::default()))
                    .collect(),
            ),
            active: Mutex::new(None),
        }
    }

    pub fn counts(&self) -> &Arc<CountCache> {
        &self.counts
    }

    pub async fn active(&self) -> Option<FeedName> {
        *self.active.lock().await
    }

    pub async fn state(&self, feed: FeedName) -> FeedState {
        self.feeds
            .lock()
            .await
            .get(&feed)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn entries(&self, feed: FeedName) -> Vec<ReviewEntry> {
        self.feeds
            .lock()
            .await
            .get(&feed)
            .map(|state| state.entries.clone())
            .unwrap_or_default()
    }

    /// Makes `feed` the active one, loading its first page only when it has
    /// never been loaded or has been invalidated since.
    pub async fn switch_to(&self, feed: FeedName) -> Result<LoadOutcome> {
        *self.active.lock().await = Some(feed);

        let needs_load = {
            let mut feeds = self.feeds.lock().await;
            let state = feeds.entry(feed).or_default();
            if !state.loaded || state.invalidated {
                state.reset();
                true
            } else {
                false
            }
        };

        if needs_load {
            ::log::debug!("loading {} feed from the first page", feed);
            self.load_more(feed).await
        } else {
            Ok(LoadOutcome::Skipped)
        }
    }

    pub async fn reset(&self, feed: FeedName) {
        self.feeds.lock().await.entry(feed).or_default().reset();
    }

    /// Marks `feed` stale; it reloads from page 1 the next time it is
    /// switched to or paged. Loaded entries stay visible until then.
    pub async fn invalidate(&self, feed: FeedName) {
        self.feeds.lock().await.entry(feed).or_default().invalidated = true;
    }

    pub async fn invalidate_all(&self) {
        for state in self.feeds.lock().await.values_mut() {
            state.invalidated = true;
        }
    }

    /// Fetches the next page of `feed`. A no-op while another page of the
    /// same feed is in flight or after the last page. A stale feed starts
    /// over from page 1, since its server-side order has shifted.
    pub async fn load_more(&self, feed: FeedName) -> Result<LoadOutcome> {
        let (mut page, mut generation) = {
            let mut feeds = self.feeds.lock().await;
            let state = feeds.entry(feed).or_default();
            if state.loading {
                return Ok(LoadOutcome::Skipped);
            }
            if state.invalidated {
                ::log::debug!("{} feed is stale, restarting from page 1", feed);
                state.reset();
            }
            if !state.has_more {
                return Ok(LoadOutcome::Skipped);
            }
            state.loading = true;
            state.loaded = true;
            (state.page, state.generation)
        };

        loop {
            ::log::debug!("fetching page {} of {} feed", page, feed);
            let result = self.fetch_page(feed, page).await;

            let mut feeds = self.feeds.lock().await;
            let state = feeds.entry(feed).or_default();

            if state.generation != generation {
                // reset while in flight: this request still holds `loading`
                ::log::debug!(
                    "{} feed was reset during page {}, reloading",
                    feed,
                    page
                );
                state.loaded = true;
                page = state.page;
                generation = state.generation;
                continue;
            }
            state.loading = false;

            return match result {
                Ok(records) => {
                    let ids: Vec<ReviewId> =
                        records.iter().map(|record| record.id).collect();
                    // read counts now so votes confirmed during the fetch show up
                    let counts = self.counts.snapshot(&ids).await;
                    // a server that ignores `limit` and sends more is not done
                    let has_more = records.len() >= PAGE_SIZE as usize;
                    let entries: Vec<ReviewEntry> = records
                        .into_iter()
                        .map(|record| {
                            let cover_url =
                                self.api.resolve_cover_url(&record.cover_url);
                            let entry_counts = counts
                                .get(&record.id)
                                .copied()
                                .unwrap_or_default();
                            ReviewEntry::from_record(
                                record,
                                cover_url,
                                &entry_counts,
                            )
                        })
                        .collect();
                    let added = entries.len();

                    if page == 1 {
                        state.entries = entries;
                    } else {
                        state.entries.extend(entries);
                    }
                    state.has_more = has_more;
                    state.page = page + 1;

                    Ok(LoadOutcome::Loaded { added, has_more })
                }
                Err(err) if is_end_of_data(&err) => {
                    ::log::debug!("{} feed has no page {}", feed, page);
                    state.has_more = false;
                    Ok(LoadOutcome::Exhausted)
                }
                Err(err) => {
                    ::log::warn!(
                        "failed to load page {} of {} feed: {:#}",
                        page,
                        feed,
                        err
                    );
                    Err(err.context(format!(
                        "loading page {} of {} feed",
                        page, feed
                    )))
                }
            };
        }
    }

    async fn fetch_page(
        &self,
        feed: FeedName,
        page: u32,
    ) -> Result<Vec<ReviewRecord>> {
        let records = self.api.fetch_reviews(feed, page, PAGE_SIZE).await?;
        let ids: Vec<ReviewId> =
            records.iter().map(|record| record.id).collect();
        self.counts.get_or_fetch(&ids).await;
        Ok(records)
    }

    /// Overwrites the derived fields of every entry for `review_id` in every
    /// feed. Returns how many entries changed.
    pub async fn apply_counts(
        &self,
        review_id: ReviewId,
        counts: &CountCacheEntry,
    ) -> usize {
        apply_to_feeds(&mut *self.feeds.lock().await, review_id, counts)
    }

    /// Rewrites the cached counts for `review_id` and shows the result in
    /// every feed, all while holding the feed lock so two writers cannot
    /// leave the feeds showing the older entry.
    pub async fn update_counts<F>(
        &self,
        review_id: ReviewId,
        update: F,
    ) -> (CountCacheEntry, usize)
    where
        F: FnOnce(&mut CountCacheEntry) + Send,
    {
        let mut feeds = self.feeds.lock().await;
        let entry = self.counts.update(review_id, update).await;
        let updated = apply_to_feeds(&mut feeds, review_id, &entry);
        (entry, updated)
    }

    /// Drops a deleted review from every feed.
    pub async fn remove_review(&self, review_id: ReviewId) -> usize {
        let mut removed = 0;
        for state in self.feeds.lock().await.values_mut() {
            let before = state.entries.len();
            state.entries.retain(|entry| entry.id != review_id);
            removed += before - state.entries.len();
        }
        removed
    }
}

fn apply_to_feeds(
    feeds: &mut HashMap<FeedName, FeedState>,
    review_id: ReviewId,
    counts: &CountCacheEntry,
) -> usize {
    let mut updated = 0;
    for state in feeds.values_mut() {
        for entry in state.entries.iter_mut().filter(|e| e.id == review_id) {
            entry.apply_counts(counts);
            updated += 1;
        }
    }
    updated
}
