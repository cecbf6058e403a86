use crate::api::ReviewApi;
use crate::count_cache::CountCache;
use crate::feed::FeedSet;
use crate::model::{
    toggle_vote, CountCacheEntry, ReviewId, VoteDirection, VoteTally,
};
use ::anyhow::Result;
use ::std::collections::HashSet;
use ::std::sync::Arc;
use ::tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The server accepted the vote; these counts are now everywhere.
    Applied(CountCacheEntry),
    /// Another vote on the same review has not been answered yet.
    InFlight,
}

/// Sends votes and writes the server's answer into the count cache and
/// every feed. Nothing changes locally until the server confirms.
pub struct VoteReconciler {
    api: Arc<dyn ReviewApi>,
    counts: Arc<CountCache>,
    feeds: Arc<FeedSet>,
    in_flight: Mutex<HashSet<ReviewId>>,
}

impl VoteReconciler {
    pub fn new(
        api: Arc<dyn ReviewApi>,
        counts: Arc<CountCache>,
        feeds: Arc<FeedSet>,
    ) -> Self {
        VoteReconciler {
            api,
            counts,
            feeds,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub async fn is_in_flight(&self, review_id: ReviewId) -> bool {
        self.in_flight.lock().await.contains(&review_id)
    }

    pub async fn vote(
        &self,
        review_id: ReviewId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        if !self.in_flight.lock().await.insert(review_id) {
            ::log::debug!("vote on review {} already in flight", review_id);
            return Ok(VoteOutcome::InFlight);
        }

        let result = self.submit(review_id, direction).await;
        self.in_flight.lock().await.remove(&review_id);
        result
    }

    async fn submit(
        &self,
        review_id: ReviewId,
        direction: VoteDirection,
    ) -> Result<VoteOutcome> {
        // the toggle rule and the comment count come from the cached entry
        self.counts.get_or_fetch(&[review_id]).await;

        let response = match self
            .api
            .vote(review_id, direction.as_user_vote())
            .await
        {
            Ok(response) => response,
            Err(err) => {
                ::log::warn!("vote on review {} failed: {:#}", review_id, err);
                return Err(err.context(format!("voting on review {}", review_id)));
            }
        };

        let (entry, updated) = self
            .feeds
            .update_counts(review_id, |entry| {
                let previous = entry.user_vote;
                entry.user_vote = response
                    .user_vote
                    .unwrap_or_else(|| toggle_vote(previous, direction));
                entry.vote_tally = VoteTally {
                    upvotes: response.upvotes,
                    downvotes: response.downvotes,
                };
            })
            .await;

        ::log::info!(
            "vote on review {} confirmed: {} up, {} down, {} entries updated",
            review_id,
            entry.vote_tally.upvotes,
            entry.vote_tally.downvotes,
            updated
        );
        Ok(VoteOutcome::Applied(entry))
    }
}
