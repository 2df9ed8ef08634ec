mod client;
mod config;
mod error;
mod feed;
mod format;
mod loader;
mod models;
mod pagination;
mod source;
mod trigger;

pub use client::{
    ApiClient, CommentsSource, PostsSource, Session, COMMENTS_ERROR_MESSAGE, POSTS_ERROR_MESSAGE,
};
pub use config::Config;
pub use error::FetchError;
pub use feed::{comments_feed, posts_feed, CommentsFeed, KeyedFeed, PostsFeed};
pub use format::{format_count, format_timestamp};
pub use loader::{FeedLoader, FeedSnapshot, RenderSink};
pub use models::{Comment, Cursor, Id, Page, PageRequest, Post};
pub use pagination::{Items, LoadOutcome, PageState, Phase, Ticket};
pub use source::{KeyedSource, PageSource};
pub use trigger::{
    fill_until_scrollable, is_near_viewport, ScrollGeometry, ScrollMetrics, Sentinel,
    TriggerOptions, VisibilityEvent, DEFAULT_ROOT_MARGIN, SCROLL_SLACK,
};
