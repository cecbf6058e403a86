use super::{validate, ApiError, ReviewApi};
use crate::config::Config;
use crate::model::{
    Comment, CommentCount, CommentsResponse, CreateCommentRequest,
    Credentials, FeedName, LoginResponse, NewReview, ReviewId, ReviewRecord,
    Signup, UserVote, VoteCount, VoteRequest, VoteResult,
};
use crate::session_store::SessionStore;
use ::anyhow::{Context, Result};
use ::reqwest::{Client, RequestBuilder, Response};
use ::serde::de::DeserializeOwned;
use ::std::sync::Arc;
use async_trait::async_trait;

pub struct ApiMethods {
    server: String,
    user_agent: String,
    client: Client,
    session: Arc<dyn SessionStore>,
}

impl ApiMethods {
    pub fn new(config: &Config, session: Arc<dyn SessionStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("building http client")?;
        Self::with_client(&config.api_url, config.user_agent(), client, session)
    }

    pub fn with_client(
        server: &str,
        user_agent: String,
        client: Client,
        session: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        ::url::Url::parse(server)
            .with_context(|| format!("invalid API url {}", server))?;
        Ok(ApiMethods {
            server: server.trim_end_matches('/').to_string(),
            user_agent,
            client,
            session,
        })
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    async fn authorize(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let builder = builder.header("user-agent", &self.user_agent);
        match self.session.token().await? {
            Some(token) => Ok(builder.bearer_auth(token)),
            None => Ok(builder),
        }
    }

    async fn send(name: &str, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(|err| {
            ::log::warn!("{} failed to send: {}", name, err);
            ApiError::Transport(err.to_string())
        })?;
        Self::check_response(name, response).await
    }

    async fn check_response(name: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = response.text().await.unwrap_or_default();
        let message = server_message(&body).unwrap_or_else(|| {
            status.canonical_reason().unwrap_or("request failed").to_string()
        });
        ::log::debug!("{} to {} failed with status {}", name, url, status);

        Err(ApiError::Status { status, message }.into())
    }

    async fn decode<T: DeserializeOwned>(
        name: &str,
        response: Response,
    ) -> Result<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        ::serde_json::from_slice(&bytes).map_err(|err| {
            ApiError::Decode(format!("{}: {}", name, err)).into()
        })
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        validate::credentials(credentials)?;

        let builder = self.client.post(self.url("/login")).json(credentials);
        let response = Self::send("login", self.authorize(builder).await?).await?;
        let login: LoginResponse = Self::decode("login", response).await?;

        self.session.set_token(Some(login.token)).await?;
        ::log::info!("signed in as {}", credentials.email);
        Ok(())
    }

    pub async fn signup(&self, signup: &Signup) -> Result<()> {
        validate::signup(signup)?;

        let builder = self.client.post(self.url("/signup")).json(signup);
        Self::send("signup", self.authorize(builder).await?).await?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.set_token(None).await
    }
}

/// Pulls a human readable message out of an error body.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = ::serde_json::from_str::<::serde_json::Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return Some(message.to_string());
            }
        }
        if let Some(message) = value.as_str() {
            return Some(message.to_string());
        }
    }
    Some(trimmed.to_string())
}

#[async_trait]
impl ReviewApi for ApiMethods {
    async fn fetch_reviews(
        &self,
        feed: FeedName,
        page: u32,
        limit: u32,
    ) -> Result<Vec<ReviewRecord>> {
        validate::page(page, limit)?;

        let builder = self
            .client
            .get(self.url(feed.path()))
            .query(&[("page", page), ("limit", limit)]);
        let response =
            Self::send("fetchReviews", self.authorize(builder).await?).await?;
        Self::decode("fetchReviews", response).await
    }

    async fn delete_review(&self, review_id: ReviewId) -> Result<()> {
        let builder =
            self.client.delete(self.url(&format!("/reviews/{}", review_id)));
        Self::send("deleteReview", self.authorize(builder).await?).await?;
        Ok(())
    }

    async fn create_review(&self, review: &NewReview) -> Result<()> {
        validate::new_review(review)?;

        let cover = ::reqwest::multipart::Part::bytes(review.cover.bytes.to_vec())
            .file_name(review.cover.file_name.clone())
            .mime_str(&review.cover.mime_type)
            .map_err(|err| ApiError::Validation(err.to_string()))?;
        let form = ::reqwest::multipart::Form::new()
            .text("title", review.title.clone())
            .text("author", review.author.clone())
            .text("genre", review.genre.clone())
            .text("review", review.review.clone())
            .text("rating", review.rating.to_string())
            .part("coverUrl", cover);

        let builder = self
            .client
            .post(self.url("/create-review-post"))
            .multipart(form);
        Self::send("createReviewPost", self.authorize(builder).await?).await?;
        Ok(())
    }

    async fn comment_count(&self, review_id: ReviewId) -> Result<i64> {
        let builder = self
            .client
            .get(self.url(&format!("/count-comments/{}", review_id)));
        let response =
            Self::send("countComments", self.authorize(builder).await?).await?;
        let count: CommentCount =
            Self::decode("countComments", response).await?;
        Ok(count.total_comments)
    }

    async fn comments(&self, review_id: ReviewId) -> Result<Vec<Comment>> {
        let builder =
            self.client.get(self.url(&format!("/comments/{}", review_id)));
        let response =
            Self::send("getComments", self.authorize(builder).await?).await?;
        let comments: CommentsResponse =
            Self::decode("getComments", response).await?;
        Ok(comments.data)
    }

    async fn create_comment(
        &self,
        review_id: ReviewId,
        comment: &str,
    ) -> Result<()> {
        validate::comment(comment)?;

        let builder = self
            .client
            .post(self.url(&format!("/create-comment/{}", review_id)))
            .json(&CreateCommentRequest { comment });
        Self::send("createComment", self.authorize(builder).await?).await?;
        Ok(())
    }

    async fn vote_count(&self, review_id: ReviewId) -> Result<VoteCount> {
        let builder =
            self.client.get(self.url(&format!("/vote/count/{}", review_id)));
        let response =
            Self::send("voteCount", self.authorize(builder).await?).await?;
        Self::decode("voteCount", response).await
    }

    async fn vote(
        &self,
        review_id: ReviewId,
        vote_type: UserVote,
    ) -> Result<VoteResult> {
        let builder = self
            .client
            .post(self.url(&format!("/vote/{}", review_id)))
            .json(&VoteRequest { vote_type });
        let response = Self::send("vote", self.authorize(builder).await?).await?;
        Self::decode("vote", response).await
    }

    fn resolve_cover_url(&self, cover_url: &str) -> String {
        if cover_url.is_empty()
            || cover_url.starts_with("http://")
            || cover_url.starts_with("https://")
        {
            cover_url.to_string()
        } else if cover_url.starts_with('/') {
            format!("{}{}", self.server, cover_url)
        } else {
            format!("{}/{}", self.server, cover_url)
        }
    }
}
