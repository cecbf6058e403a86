use ::serde::{Deserialize, Deserializer, Serialize};

pub type ReviewId = i64;

/// Number of reviews requested per page for every feed.
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedName {
    Popular,
    Recent,
    Mine,
}

impl FeedName {
    pub const ALL: [FeedName; 3] =
        [FeedName::Popular, FeedName::Recent, FeedName::Mine];

    pub fn path(&self) -> &'static str {
        match self {
            FeedName::Popular => "/reviews/top",
            FeedName::Recent => "/reviews/recent",
            FeedName::Mine => "/reviews/my",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedName::Popular => "popular",
            FeedName::Recent => "recent",
            FeedName::Mine => "mine",
        }
    }
}

impl ::std::fmt::Display for FeedName {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ::std::str::FromStr for FeedName {
    type Err = ::anyhow::Error;

    fn from_str(s: &str) -> ::anyhow::Result<FeedName> {
        match s {
            "popular" | "top" => Ok(FeedName::Popular),
            "recent" => Ok(FeedName::Recent),
            "mine" | "my" => Ok(FeedName::Mine),
            _ => Err(::anyhow::anyhow!("Unknown feed: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVote {
    Upvote,
    Downvote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_user_vote(self) -> UserVote {
        match self {
            VoteDirection::Up => UserVote::Upvote,
            VoteDirection::Down => UserVote::Downvote,
        }
    }
}

/// Vote held by the user after pressing `direction` while holding
/// `previous`. Pressing the held direction again clears it.
pub fn toggle_vote(
    previous: Option<UserVote>,
    direction: VoteDirection,
) -> Option<UserVote> {
    let pressed = direction.as_user_vote();
    if previous == Some(pressed) {
        None
    } else {
        Some(pressed)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Derived counts for one review. The user's vote is a single optional
/// value so "upvoted and downvoted" cannot be represented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountCacheEntry {
    pub comment_count: i64,
    pub vote_tally: VoteTally,
    pub user_vote: Option<UserVote>,
}

impl CountCacheEntry {
    pub fn new(comment_count: i64, vote_count: &VoteCount) -> Self {
        CountCacheEntry {
            comment_count,
            vote_tally: VoteTally {
                upvotes: vote_count.upvotes,
                downvotes: vote_count.downvotes,
            },
            user_vote: vote_count.user_vote,
        }
    }
}

/// One item of a review listing, as the server sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    pub id: ReviewId,
    #[serde(default)]
    pub cover_url: String,
    pub title: String,
    pub author: String,
    pub rating: i32,
    pub review: String,
    pub user_name: String,
    pub created_at: String,
}

/// A review joined with its counts, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewEntry {
    pub id: ReviewId,
    pub cover_url: String,
    pub title: String,
    pub author: String,
    pub rating: i32,
    pub review: String,
    pub user_name: String,
    pub created_at: String,
    pub comment_count: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub upvoted: bool,
    pub downvoted: bool,
}

impl ReviewEntry {
    pub fn from_record(
        record: ReviewRecord,
        cover_url: String,
        counts: &CountCacheEntry,
    ) -> Self {
        let mut entry = ReviewEntry {
            id: record.id,
            cover_url,
            title: record.title,
            author: record.author,
            rating: record.rating,
            review: record.review,
            user_name: record.user_name,
            created_at: record.created_at,
            comment_count: 0,
            upvotes: 0,
            downvotes: 0,
            upvoted: false,
            downvoted: false,
        };
        entry.apply_counts(counts);
        entry
    }

    pub fn apply_counts(&mut self, counts: &CountCacheEntry) {
        self.comment_count = counts.comment_count;
        self.upvotes = counts.vote_tally.upvotes;
        self.downvotes = counts.vote_tally.downvotes;
        self.upvoted = counts.user_vote == Some(UserVote::Upvote);
        self.downvoted = counts.user_vote == Some(UserVote::Downvote);
    }

    pub fn user_vote(&self) -> Option<UserVote> {
        match (self.upvoted, self.downvoted) {
            (true, _) => Some(UserVote::Upvote),
            (false, true) => Some(UserVote::Downvote),
            (false, false) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentCount {
    #[serde(default)]
    pub total_comments: i64,
}

/// Response of `GET /vote/count/:id`. A missing or null `userVote` means
/// the user has not voted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCount {
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub user_vote: Option<UserVote>,
}

/// Response of `POST /vote/:id`. Unlike [`VoteCount`] the server may leave
/// out `userVote`, which is kept distinct from an explicit null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub upvotes: i64,
    pub downvotes: i64,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub user_vote: Option<Option<UserVote>>,
}

fn deserialize_present<'de, D, T>(
    deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub user_name: String,
    pub comment: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentsResponse {
    #[serde(default)]
    pub data: Vec<Comment>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateCommentRequest<'a> {
    pub comment: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VoteRequest {
    pub vote_type: UserVote,
}

#[derive(Debug, Clone)]
pub struct CoverImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: ::bytes::Bytes,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub review: String,
    pub rating: i32,
    pub cover: CoverImage,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Signup {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_vote() {
        use VoteDirection::{Down, Up};

        assert_eq!(toggle_vote(None, Up), Some(UserVote::Upvote));
        assert_eq!(toggle_vote(Some(UserVote::Upvote), Up), None);
        assert_eq!(
            toggle_vote(Some(UserVote::Upvote), Down),
            Some(UserVote::Downvote)
        );
        assert_eq!(
            toggle_vote(Some(UserVote::Downvote), Up),
            Some(UserVote::Upvote)
        );
        assert_eq!(toggle_vote(Some(UserVote::Downvote), Down), None);
    }

    #[test]
    fn test_apply_counts_sets_vote_flags() {
        let record = ReviewRecord {
            id: 3,
            cover_url: "/uploads/3.jpg".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            rating: 5,
            review: "Spice.".to_string(),
            user_name: "paul".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        };
        let counts = CountCacheEntry {
            comment_count: 4,
            vote_tally: VoteTally {
                upvotes: 7,
                downvotes: 1,
            },
            user_vote: Some(UserVote::Downvote),
        };

        let mut entry =
            ReviewEntry::from_record(record, "cover".to_string(), &counts);
        assert_eq!(entry.comment_count, 4);
        assert_eq!((entry.upvotes, entry.downvotes), (7, 1));
        assert!(!entry.upvoted);
        assert!(entry.downvoted);
        assert_eq!(entry.user_vote(), Some(UserVote::Downvote));

        entry.apply_counts(&CountCacheEntry::default());
        assert!(!entry.upvoted && !entry.downvoted);
        assert_eq!(entry.user_vote(), None);
    }

    #[test]
    fn test_vote_result_distinguishes_missing_and_null() {
        let missing: VoteResult =
            serde_json::from_str(r#"{"upvotes":2,"downvotes":1}"#).unwrap();
        assert_eq!(missing.user_vote, None);

        let null: VoteResult = serde_json::from_str(
            r#"{"upvotes":2,"downvotes":1,"userVote":null}"#,
        )
        .unwrap();
        assert_eq!(null.user_vote, Some(None));

        let present: VoteResult = serde_json::from_str(
            r#"{"upvotes":2,"downvotes":1,"userVote":"upvote"}"#,
        )
        .unwrap();
        assert_eq!(present.user_vote, Some(Some(UserVote::Upvote)));
    }

    #[test]
    fn test_feed_name_parse() {
        assert_eq!("popular".parse::<FeedName>().unwrap(), FeedName::Popular);
        assert_eq!("my".parse::<FeedName>().unwrap(), FeedName::Mine);
        assert!("trending".parse::<FeedName>().is_err());
        assert_eq!(FeedName::Recent.path(), "/reviews/recent");
    }
}
