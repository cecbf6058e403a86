use crate::model::{
    Comment, FeedName, NewReview, ReviewId, ReviewRecord, UserVote,
    VoteCount, VoteResult,
};
use ::anyhow::Result;
use async_trait::async_trait;

/// Remote operations the feed core depends on. [`super::ApiMethods`] is the
/// HTTP implementation.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn fetch_reviews(
        &self,
        feed: FeedName,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ReviewRecord>>;

    async fn delete_review(&self, review_id: ReviewId) -> Result<()>;

    async fn create_review(&self, review: &NewReview) -> Result<()>;

    async fn comment_count(&self, review_id: ReviewId) -> Result<i64>;

    async fn comments(&self, review_id: ReviewId) -> Result<Vec<Comment>>;

    async fn create_comment(
        &self,
        review_id: ReviewId,
        comment: &str,
    ) -> Result<()>;

    async fn vote_count(&self, review_id: ReviewId) -> Result<VoteCount>;

    async fn vote(
        &self,
        review_id: ReviewId,
        vote_type: UserVote,
    ) -> Result<VoteResult>;

    /// Turns the server's cover reference into something loadable.
    fn resolve_cover_url(&self, cover_url: &str) -> String {
        cover_url.to_string()
    }
}
