use crate::api::{validate, ReviewApi};
use crate::count_cache::CountCache;
use crate::feed::{FeedSet, LoadOutcome};
use crate::model::{
    Comment, CountCacheEntry, FeedName, NewReview, ReviewEntry, ReviewId,
    VoteDirection,
};
use crate::vote::{VoteOutcome, VoteReconciler};
use ::anyhow::{Context, Result};
use ::std::sync::Arc;

/// One signed-in browsing session: a single count cache shared by all feeds
/// and by the vote reconciler.
pub struct ReviewSession {
    api: Arc<dyn ReviewApi>,
    counts: Arc<CountCache>,
    feeds: Arc<FeedSet>,
    votes: VoteReconciler,
}

impl ReviewSession {
    pub fn new(api: Arc<dyn ReviewApi>) -> Self {
        let counts = Arc::new(CountCache::new(api.clone()));
        let feeds = Arc::new(FeedSet::new(api.clone(), counts.clone()));
        let votes = VoteReconciler::new(api.clone(), counts.clone(), feeds.clone());
        ReviewSession {
            api,
            counts,
            feeds,
            votes,
        }
    }

    pub fn counts(&self) -> &Arc<CountCache> {
        &self.counts
    }

    pub fn feeds(&self) -> &Arc<FeedSet> {
        &self.feeds
    }

    pub async fn switch_to(&self, feed: FeedName) -> Result<LoadOutcome> {
        self.feeds.switch_to(feed).await
    }

    pub async fn load_more(&self, feed: FeedName) -> Result<LoadOutcome> {
        self.feeds.load_more(feed).await
    }

    pub async fn entries(&self, feed: FeedName) -> Vec<ReviewEntry> {
        self.feeds.entries(feed).await
    }

    pub async fn vote(
        &self,
        review_id: ReviewId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        self.votes.vote(review_id, direction).await
    }

    pub async fn delete_review(&self, review_id: ReviewId) -> Result<()> {
        self.api
            .delete_review(review_id)
            .await
            .with_context(|| format!("deleting review {}", review_id))?;

        self.counts.invalidate(review_id).await;
        let removed = self.feeds.remove_review(review_id).await;
        self.feeds.invalidate_all().await;

        ::log::info!("deleted review {} ({} entries removed)", review_id, removed);
        Ok(())
    }

    pub async fn create_review(&self, review: &NewReview) -> Result<()> {
        validate::new_review(review)?;

        self.api
            .create_review(review)
            .await
            .with_context(|| format!("creating review {:?}", review.title))?;

        self.feeds.invalidate_all().await;

        ::log::info!("created review {:?}", review.title);
        Ok(())
    }

    pub async fn comments(&self, review_id: ReviewId) -> Result<Vec<Comment>> {
        self.api
            .comments(review_id)
            .await
            .with_context(|| format!("loading comments for review {}", review_id))
    }

    /// Posts a comment and bumps the cached comment count on success.
    pub async fn add_comment(
        &self,
        review_id: ReviewId,
        comment: &str,
    ) -> Result<CountCacheEntry> {
        validate::comment(comment)?;

        // cache the count from before the comment so the bump is not doubled
        self.counts.get_or_fetch(&[review_id]).await;

        self.api
            .create_comment(review_id, comment)
            .await
            .with_context(|| format!("commenting on review {}", review_id))?;

        let (entry, _) = self
            .feeds
            .update_counts(review_id, |entry| entry.comment_count += 1)
            .await;
        Ok(entry)
    }
}
