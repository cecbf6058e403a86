//! Terminal front end for browsing review feeds.
//!
//! Usage:
//!   review-feed [popular|recent|mine] [pages]
//!   review-feed vote <review id> <up|down>
//!   review-feed comments <review id>
//!   review-feed login <email> <password>
//!   review-feed logout
//!
//! Configuration comes from the environment, see `review_client::Config`.
//! Log output is controlled with `RUST_LOG`.

use ::anyhow::{bail, Context};
use ::std::sync::Arc;
use review_client::{
    model::Credentials, ApiError, ApiMethods, Config, FeedName,
    FileSessionStore, LoadOutcome, MemorySessionStore, ReviewEntry,
    ReviewSession, SessionStore, VoteDirection, VoteOutcome,
};

fn print_entry(entry: &ReviewEntry) {
    let vote = match (entry.upvoted, entry.downvoted) {
        (true, _) => " [up]",
        (_, true) => " [down]",
        _ => "",
    };
    println!(
        "#{} {} by {} ({}/5) @{} +{} -{} {} comments{}",
        entry.id,
        entry.title,
        entry.author,
        entry.rating,
        entry.user_name,
        entry.upvotes,
        entry.downvotes,
        entry.comment_count,
        vote
    );
}

async fn browse(
    session: &ReviewSession,
    feed: FeedName,
    pages: u32,
) -> ::anyhow::Result<()> {
    session.switch_to(feed).await?;
    for _ in 1..pages {
        match session.load_more(feed).await? {
            LoadOutcome::Loaded { has_more: true, .. } => {}
            _ => break,
        }
    }

    let entries = session.entries(feed).await;
    if entries.is_empty() {
        println!("No reviews in the {} feed", feed);
    }
    for entry in entries.iter() {
        print_entry(entry);
    }
    Ok(())
}

async fn run(args: &[String]) -> ::anyhow::Result<()> {
    let config = Config::from_env()?;

    let store: Arc<dyn SessionStore> = match &config.token_path {
        Some(path) => Arc::new(FileSessionStore::new(path)),
        None => Arc::new(MemorySessionStore::new()),
    };
    let api = Arc::new(ApiMethods::new(&config, store)?);

    match args.first().map(String::as_str) {
        Some("login") => {
            let (Some(email), Some(password)) = (args.get(1), args.get(2)) else {
                bail!("usage: review-feed login <email> <password>");
            };
            api.login(&Credentials {
                email: email.clone(),
                password: password.clone(),
            })
            .await?;
            println!("Signed in");
        }
        Some("logout") => {
            api.logout().await?;
            println!("Signed out");
        }
        Some("vote") => {
            let review_id: i64 = args
                .get(1)
                .context("missing review id")?
                .parse()
                .context("review id must be a number")?;
            let direction = match args.get(2).map(String::as_str) {
                Some("up") => VoteDirection::Up,
                Some("down") => VoteDirection::Down,
                _ => bail!("usage: review-feed vote <review id> <up|down>"),
            };

            let session = ReviewSession::new(api);
            match session.vote(review_id, direction).await? {
                VoteOutcome::Applied(entry) => println!(
                    "Review {}: +{} -{}",
                    review_id,
                    entry.vote_tally.upvotes,
                    entry.vote_tally.downvotes
                ),
                VoteOutcome::InFlight => println!("Vote already pending"),
            }
        }
        Some("comments") => {
            let review_id: i64 = args
                .get(1)
                .context("missing review id")?
                .parse()
                .context("review id must be a number")?;

            let session = ReviewSession::new(api);
            for comment in session.comments(review_id).await? {
                println!(
                    "@{} ({}): {}",
                    comment.user_name, comment.created_at, comment.comment
                );
            }
        }
        feed => {
            let feed: FeedName = feed.unwrap_or("popular").parse()?;
            let pages: u32 = match args.get(1) {
                Some(pages) => pages.parse().context("pages must be a number")?,
                None => 1,
            };

            let session = ReviewSession::new(api);
            browse(&session, feed, pages).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    ::env_logger::Builder::from_env(
        ::env_logger::Env::default().default_filter_or("info"),
    )
    .init();

    let args: Vec<String> = ::std::env::args().skip(1).collect();

    if let Err(err) = run(&args).await {
        match ApiError::from_anyhow(&err) {
            Some(api_error) => eprintln!("Error: {}", api_error.user_message()),
            None => eprintln!("Error: {:#}", err),
        }
        ::std::process::exit(1);
    }
}
