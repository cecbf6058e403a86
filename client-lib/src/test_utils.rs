//! In-memory [`ReviewApi`] used by the unit tests.

use crate::api::{ApiError, ReviewApi};
use crate::model::{
    toggle_vote, Comment, FeedName, NewReview, ReviewId, ReviewRecord,
    UserVote, VoteCount, VoteDirection, VoteResult,
};
use ::anyhow::Result;
use ::reqwest::StatusCode;
use ::std::collections::{HashMap, HashSet};
use ::std::sync::{Arc, Mutex};
use ::tokio::sync::Semaphore;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchReviews(FeedName, u32),
    DeleteReview(ReviewId),
    CreateReview(String),
    CommentCount(ReviewId),
    Comments(ReviewId),
    CreateComment(ReviewId),
    VoteCount(ReviewId),
    Vote(ReviewId, UserVote),
}

#[derive(Clone)]
enum PageReply {
    Records(Vec<ReviewRecord>),
    NotFound,
    Fail,
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    pages: HashMap<(FeedName, u32), PageReply>,
    comment_counts: HashMap<ReviewId, i64>,
    failing_comment_counts: HashSet<ReviewId>,
    vote_counts: HashMap<ReviewId, VoteCount>,
    failing_vote_counts: HashSet<ReviewId>,
    comments: HashMap<ReviewId, Vec<Comment>>,
    fail_votes: bool,
    report_user_vote: bool,
    fail_mutations: bool,
}

#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
    page_gate: Mutex<Option<Arc<Semaphore>>>,
    count_gate: Mutex<Option<Arc<Semaphore>>>,
    vote_gate: Mutex<Option<Arc<Semaphore>>>,
}

pub fn record(id: ReviewId) -> ReviewRecord {
    ReviewRecord {
        id,
        cover_url: format!("/uploads/{}.jpg", id),
        title: format!("Book {}", id),
        author: "Author".to_string(),
        rating: 4,
        review: "Worth reading.".to_string(),
        user_name: "reader".to_string(),
        created_at: "2024-05-01T12:00:00Z".to_string(),
    }
}

pub fn records(ids: ::std::ops::Range<ReviewId>) -> Vec<ReviewRecord> {
    ids.map(record).collect()
}

impl MockApi {
    pub fn new() -> Self {
        let api = MockApi::default();
        api.state.lock().unwrap().report_user_vote = true;
        api
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    pub fn set_page(&self, feed: FeedName, page: u32, items: Vec<ReviewRecord>) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert((feed, page), PageReply::Records(items));
    }

    pub fn set_page_not_found(&self, feed: FeedName, page: u32) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert((feed, page), PageReply::NotFound);
    }

    pub fn fail_page(&self, feed: FeedName, page: u32) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert((feed, page), PageReply::Fail);
    }

    pub fn set_comment_count(&self, review_id: ReviewId, count: i64) {
        self.state
            .lock()
            .unwrap()
            .comment_counts
            .insert(review_id, count);
    }

    pub fn fail_comment_count(&self, review_id: ReviewId) {
        self.state
            .lock()
            .unwrap()
            .failing_comment_counts
            .insert(review_id);
    }

    pub fn set_vote_count(&self, review_id: ReviewId, count: VoteCount) {
        self.state
            .lock()
            .unwrap()
            .vote_counts
            .insert(review_id, count);
    }

    pub fn fail_vote_count(&self, review_id: ReviewId) {
        self.state
            .lock()
            .unwrap()
            .failing_vote_counts
            .insert(review_id);
    }

    pub fn set_fail_votes(&self, fail: bool) {
        self.state.lock().unwrap().fail_votes = fail;
    }

    pub fn set_report_user_vote(&self, report: bool) {
        self.state.lock().unwrap().report_user_vote = report;
    }

    pub fn set_fail_mutations(&self, fail: bool) {
        self.state.lock().unwrap().fail_mutations = fail;
    }

    /// Page fetches block until a permit is added to the returned gate.
    pub fn gate_pages(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.page_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Comment count requests block until a permit is added to the
    /// returned gate.
    pub fn gate_counts(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.count_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Vote requests block until a permit is added to the returned gate.
    pub fn gate_votes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.vote_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn record_call(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    async fn pass(gate: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    fn server_error() -> ::anyhow::Error {
        ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal Server Error".to_string(),
        }
        .into()
    }
}

#[async_trait]
impl ReviewApi for MockApi {
    async fn fetch_reviews(
        &self,
        feed: FeedName,
        page: u32,
        _limit: u32,
    ) -> Result<Vec<ReviewRecord>> {
        self.record_call(Call::FetchReviews(feed, page));
        Self::pass(&self.page_gate).await;

        let reply = self.state.lock().unwrap().pages.get(&(feed, page)).cloned();
        match reply {
            Some(PageReply::Records(items)) => Ok(items),
            Some(PageReply::Fail) => {
                Err(ApiError::Transport("connection reset".to_string()).into())
            }
            Some(PageReply::NotFound) | None => Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                message: "No reviews found".to_string(),
            }
            .into()),
        }
    }

    async fn delete_review(&self, review_id: ReviewId) -> Result<()> {
        self.record_call(Call::DeleteReview(review_id));
        if self.state.lock().unwrap().fail_mutations {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn create_review(&self, review: &NewReview) -> Result<()> {
        self.record_call(Call::CreateReview(review.title.clone()));
        if self.state.lock().unwrap().fail_mutations {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn comment_count(&self, review_id: ReviewId) -> Result<i64> {
        self.record_call(Call::CommentCount(review_id));
        Self::pass(&self.count_gate).await;
        let state = self.state.lock().unwrap();
        if state.failing_comment_counts.contains(&review_id) {
            return Err(Self::server_error());
        }
        Ok(state.comment_counts.get(&review_id).copied().unwrap_or(0))
    }

    async fn comments(&self, review_id: ReviewId) -> Result<Vec<Comment>> {
        self.record_call(Call::Comments(review_id));
        Ok(self
            .state
            .lock()
            .unwrap()
            .comments
            .get(&review_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_comment(
        &self,
        review_id: ReviewId,
        comment: &str,
    ) -> Result<()> {
        self.record_call(Call::CreateComment(review_id));
        let mut state = self.state.lock().unwrap();
        if state.fail_mutations {
            return Err(Self::server_error());
        }
        let comments = state.comments.entry(review_id).or_default();
        comments.push(Comment {
            id: comments.len() as i64 + 1,
            user_name: "reader".to_string(),
            comment: comment.to_string(),
            created_at: "2024-05-02T08:00:00Z".to_string(),
        });
        *state.comment_counts.entry(review_id).or_insert(0) += 1;
        Ok(())
    }

    async fn vote_count(&self, review_id: ReviewId) -> Result<VoteCount> {
        self.record_call(Call::VoteCount(review_id));
        let state = self.state.lock().unwrap();
        if state.failing_vote_counts.contains(&review_id) {
            return Err(Self::server_error());
        }
        Ok(state.vote_counts.get(&review_id).copied().unwrap_or_default())
    }

    async fn vote(
        &self,
        review_id: ReviewId,
        vote_type: UserVote,
    ) -> Result<VoteResult> {
        self.record_call(Call::Vote(review_id, vote_type));
        Self::pass(&self.vote_gate).await;

        let mut state = self.state.lock().unwrap();
        if state.fail_votes {
            return Err(
                ApiError::Transport("network unreachable".to_string()).into()
            );
        }

        let report_user_vote = state.report_user_vote;
        let count = state.vote_counts.entry(review_id).or_default();
        let direction = match vote_type {
            UserVote::Upvote => VoteDirection::Up,
            UserVote::Downvote => VoteDirection::Down,
        };
        let next = toggle_vote(count.user_vote, direction);

        match count.user_vote {
            Some(UserVote::Upvote) => count.upvotes -= 1,
            Some(UserVote::Downvote) => count.downvotes -= 1,
            None => {}
        }
        match next {
            Some(UserVote::Upvote) => count.upvotes += 1,
            Some(UserVote::Downvote) => count.downvotes += 1,
            None => {}
        }
        count.user_vote = next;

        Ok(VoteResult {
            upvotes: count.upvotes,
            downvotes: count.downvotes,
            user_vote: if report_user_vote { Some(next) } else { None },
        })
    }

    fn resolve_cover_url(&self, cover_url: &str) -> String {
        format!("http://mock{}", cover_url)
    }
}
