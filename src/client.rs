use log::{debug, warn};
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::FetchError;
use crate::models::{
    Comment, CommentsData, Envelope, ErrorBody, Id, Page, PageRequest, Post, PostsData,
};
use crate::source::{KeyedSource, PageSource};

pub const POSTS_ERROR_MESSAGE: &str = "게시글을 불러오지 못했습니다.";
pub const COMMENTS_ERROR_MESSAGE: &str = "댓글을 불러오지 못했습니다.";

/// Credentials attached to outgoing requests.
///
/// Passed to each client explicitly so authenticated and anonymous clients
/// can live side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Bearer(String),
}

impl Session {
    pub fn from_token(token: Option<String>) -> Self {
        match token {
            Some(token) if !token.trim().is_empty() => Session::Bearer(token),
            _ => Session::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Bearer(_))
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
            session,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url.clone(), config.session.clone())
    }

    /// Same transport, different credentials.
    pub fn with_session(&self, session: Session) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn fetch_posts(&self, request: PageRequest) -> Result<Page<Post>, FetchError> {
        let data: PostsData = self
            .get_data("/posts", &request, POSTS_ERROR_MESSAGE)
            .await?;
        Ok(Page {
            items: data.posts,
            next_cursor: data.next_cursor,
        })
    }

    pub async fn fetch_comments(
        &self,
        post_id: &Id,
        request: PageRequest,
    ) -> Result<Page<Comment>, FetchError> {
        let path = format!("/posts/{post_id}/comments");
        let data: CommentsData = self
            .get_data(&path, &request, COMMENTS_ERROR_MESSAGE)
            .await?;
        Ok(Page {
            items: data.comments,
            next_cursor: data.next_cursor,
        })
    }

    async fn get_data<D>(
        &self,
        path: &str,
        request: &PageRequest,
        fallback: &str,
    ) -> Result<D, FetchError>
    where
        D: DeserializeOwned + Default,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, request);

        let mut builder = self
            .http
            .get(&url)
            .query(&request.query())
            .header(ACCEPT, "application/json");
        if let Session::Bearer(token) = &self.session {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|source| FetchError::Transport {
            message: fallback.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|source| FetchError::Transport {
            message: fallback.to_string(),
            source,
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| fallback.to_string());
            warn!("GET {} failed with {}: {}", url, status, message);
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<D> =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode {
                message: fallback.to_string(),
                source,
            })?;
        if let Some(message) = &envelope.message {
            debug!("GET {} -> {}", url, message);
        }
        Ok(envelope.data.unwrap_or_default())
    }
}

/// The main post feed.
#[derive(Debug, Clone)]
pub struct PostsSource {
    client: ApiClient,
    numeric_cursors: bool,
}

impl PostsSource {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            numeric_cursors: false,
        }
    }

    /// Treat the next cursor as a positive number; anything else ends the feed.
    pub fn numeric_cursors(mut self) -> Self {
        self.numeric_cursors = true;
        self
    }
}

impl PageSource for PostsSource {
    type Item = Post;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Post>, FetchError> {
        let mut page = self.client.fetch_posts(request).await?;
        if self.numeric_cursors {
            page.next_cursor = page.next_cursor.and_then(|c| c.normalize_numeric());
        }
        Ok(page)
    }
}

/// Comments of one post.
#[derive(Debug, Clone)]
pub struct CommentsSource {
    client: ApiClient,
    post_id: Id,
}

impl CommentsSource {
    pub fn new(client: ApiClient, post_id: Id) -> Self {
        Self { client, post_id }
    }

    pub fn post_id(&self) -> &Id {
        &self.post_id
    }
}

impl PageSource for CommentsSource {
    type Item = Comment;

    async fn fetch_page(&self, request: PageRequest) -> Result<Page<Comment>, FetchError> {
        self.client.fetch_comments(&self.post_id, request).await
    }
}

impl KeyedSource for CommentsSource {
    type Key = Id;

    fn key(&self) -> &Id {
        &self.post_id
    }

    fn with_key(&self, post_id: Id) -> Self {
        Self {
            client: self.client.clone(),
            post_id,
        }
    }
}
