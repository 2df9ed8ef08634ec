use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use haru_feed::{
    comments_feed, format_count, format_timestamp, posts_feed, ApiClient, Comment, Config,
    FeedLoader, Id, LoadOutcome, PageSource, Post, RenderSink,
};
use log::info;

#[derive(Parser, Debug)]
struct Args {
    /// Show the comments of this post instead of the main feed
    #[arg(long)]
    post_id: Option<String>,

    /// Stop after this many pages
    #[arg(long, default_value_t = 3)]
    pages: usize,

    /// API base URL, overrides HARU_API_BASE_URL
    /// Ex: http://localhost:8080
    #[arg(long)]
    base_url: Option<String>,

    /// Page size, overrides the configured limit
    #[arg(long)]
    limit: Option<u32>,
}

struct Printer;

impl RenderSink<Post> for Printer {
    fn append(&mut self, batch: &[Post]) {
        for post in batch {
            println!(
                "[{}] {} - {} (likes {}, comments {}, views {}) {}",
                post.id,
                post.title.as_deref().unwrap_or("이름 없는 조각"),
                post.author_nickname.as_deref().unwrap_or("익명"),
                format_count(post.like_count),
                format_count(post.comment_count),
                format_count(post.view_count),
                format_timestamp(post.created_at.as_deref().unwrap_or_default()),
            );
        }
    }
}

impl RenderSink<Comment> for Printer {
    fn append(&mut self, batch: &[Comment]) {
        for comment in batch {
            println!(
                "[{}] {}: {} {}",
                comment.id,
                comment.user_nickname.as_deref().unwrap_or("익명"),
                comment.content.as_deref().unwrap_or_default(),
                format_timestamp(comment.create_at.as_deref().unwrap_or_default()),
            );
        }
    }
}

async fn walk<S>(loader: FeedLoader<S>, pages: usize) -> Result<()>
where
    S: PageSource + Send + Sync + 'static,
    Printer: RenderSink<S::Item>,
{
    let mut printer = Printer;
    for page in 1..=pages {
        match loader.load_more_into(&mut printer).await {
            LoadOutcome::Appended { exhausted, .. } if exhausted => {
                println!("-- 마지막 조각입니다.");
                break;
            }
            LoadOutcome::Appended { .. } => info!("page {} done", page),
            LoadOutcome::Failed(message) => anyhow::bail!(message),
            LoadOutcome::Skipped | LoadOutcome::Stale => break,
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load_env_config()?;
    if let Some(base_url) = args.base_url {
        config.api_base_url = base_url;
    }
    if let Some(limit) = args.limit {
        config.posts_limit = limit;
        config.comments_limit = limit;
    }

    let client = ApiClient::from_config(&config);
    info!(
        "Browsing {} ({})",
        client.base_url(),
        if client.session().is_authenticated() {
            "authenticated"
        } else {
            "anonymous"
        }
    );

    match args.post_id {
        Some(raw) => {
            let post_id = raw
                .parse::<i64>()
                .map(Id::Int)
                .unwrap_or_else(|_| Id::Str(raw));
            let feed = comments_feed(client, post_id, &config);
            walk(feed.loader().clone(), args.pages).await
        }
        None => walk(posts_feed(client, &config), args.pages).await,
    }
}
