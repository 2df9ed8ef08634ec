use log::info;

use crate::client::{ApiClient, CommentsSource, PostsSource};
use crate::config::Config;
use crate::loader::FeedLoader;
use crate::models::Id;
use crate::pagination::LoadOutcome;
use crate::source::KeyedSource;

pub type PostsFeed = FeedLoader<PostsSource>;

/// A comment list, one per post.
pub type CommentsFeed = KeyedFeed<CommentsSource>;

pub fn posts_feed(client: ApiClient, config: &Config) -> PostsFeed {
    FeedLoader::new(PostsSource::new(client), config.posts_limit)
}

pub fn comments_feed(client: ApiClient, post_id: Id, config: &Config) -> CommentsFeed {
    KeyedFeed::new(CommentsSource::new(client, post_id), config.comments_limit)
}

/// A feed whose identity can change while it is mounted. Switching identity
/// throws away everything loaded so far, and answers still in flight for the
/// old identity never reach the new one.
pub struct KeyedFeed<S: KeyedSource> {
    loader: FeedLoader<S>,
}

impl<S: KeyedSource> Clone for KeyedFeed<S> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
        }
    }
}

impl<S> KeyedFeed<S>
where
    S: KeyedSource + Send + Sync + 'static,
{
    pub fn new(source: S, limit: u32) -> Self {
        Self {
            loader: FeedLoader::new(source, limit),
        }
    }

    pub fn loader(&self) -> &FeedLoader<S> {
        &self.loader
    }

    pub async fn key(&self) -> S::Key {
        self.loader.source().await.key().clone()
    }

    /// Mounts `key` and loads its first page. Returns `None` if `key` is
    /// already mounted.
    pub async fn switch_to(&self, key: S::Key) -> Option<LoadOutcome> {
        let source = self.loader.source().await;
        if *source.key() == key {
            return None;
        }
        info!("switching feed from {:?} to {:?}", source.key(), key);
        self.loader.remount(source.with_key(key)).await;
        Some(self.loader.initial_load().await)
    }

    /// Back to page one of the current identity, e.g. after the user posted.
    pub async fn refresh(&self) -> LoadOutcome {
        self.loader.reload().await
    }
}
