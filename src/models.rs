use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Opaque pagination token handed out by the server.
///
/// The backend is inconsistent about the JSON type, so both strings and
/// integers are accepted and compared by their textual form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cursor {
    Int(i64),
    Str(String),
}

impl Cursor {
    /// Numeric cursors from the post feed use `0` and negatives as "no more".
    pub fn normalize_numeric(self) -> Option<Cursor> {
        match self {
            Cursor::Int(n) if n <= 0 => None,
            Cursor::Str(s) => match s.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 => Some(Cursor::Str(s)),
                _ => None,
            },
            other => Some(other),
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Int(n) => write!(f, "{n}"),
            Cursor::Str(s) => f.write_str(s),
        }
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cursor::Int(a), Cursor::Int(b)) => a == b,
            (Cursor::Str(a), Cursor::Str(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for Cursor {}

impl Hash for Cursor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl From<&str> for Cursor {
    fn from(value: &str) -> Self {
        Cursor::Str(value.to_string())
    }
}

impl From<i64> for Cursor {
    fn from(value: i64) -> Self {
        Cursor::Int(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub cursor: Option<Cursor>,
    pub limit: u32,
}

impl PageRequest {
    /// Query pairs in wire order. The cursor is omitted on the first page.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("limit", self.limit.to_string())];
        if let Some(cursor) = &self.cursor {
            query.push(("cursor", cursor.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    Int(i64),
    Str(String),
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(n) => write!(f, "{n}"),
            Id::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawPost")]
pub struct Post {
    pub id: Id,
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub thumbnail_image_url: Option<String>,
    pub like_count: u64,
    pub comment_count: u64,
    pub view_count: u64,
    pub author_nickname: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawComment")]
pub struct Comment {
    pub id: Id,
    pub content: Option<String>,
    pub user_id: Option<Id>,
    pub user_nickname: Option<String>,
    pub user_profile_image_url: Option<String>,
    pub create_at: Option<String>,
}

/// First spelling that carries a value. Servers send several names for the
/// same field, sometimes together and sometimes as explicit nulls.
fn first<T, const N: usize>(candidates: [Option<T>; N]) -> Option<T> {
    candidates.into_iter().flatten().next()
}

#[derive(Deserialize)]
struct RawPost {
    id: Id,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    thumbnail_image_url: Option<String>,
    #[serde(default)]
    like_count: Option<u64>,
    #[serde(default, rename = "likeCount")]
    like_count_camel: Option<u64>,
    #[serde(default)]
    comment_count: Option<u64>,
    #[serde(default, rename = "commentCount")]
    comment_count_camel: Option<u64>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default, rename = "viewCount")]
    view_count_camel: Option<u64>,
    #[serde(default)]
    author_nickname: Option<String>,
    #[serde(default)]
    user_nickname: Option<String>,
    #[serde(default)]
    user_nick_name: Option<String>,
    #[serde(default, rename = "userNickname")]
    user_nickname_camel: Option<String>,
    #[serde(default, rename = "userNickName")]
    user_nick_name_camel: Option<String>,
    #[serde(default)]
    profile_image_url: Option<String>,
    #[serde(default, rename = "profileImageUrl")]
    profile_image_url_camel: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default, rename = "createdAt")]
    created_at_camel: Option<String>,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            content: raw.content,
            image_url: raw.image_url,
            thumbnail_image_url: raw.thumbnail_image_url,
            like_count: first([raw.like_count, raw.like_count_camel]).unwrap_or(0),
            comment_count: first([raw.comment_count, raw.comment_count_camel]).unwrap_or(0),
            view_count: first([raw.view_count, raw.view_count_camel]).unwrap_or(0),
            author_nickname: first([
                raw.author_nickname,
                raw.user_nickname,
                raw.user_nick_name,
                raw.user_nickname_camel,
                raw.user_nick_name_camel,
            ]),
            profile_image_url: first([raw.profile_image_url, raw.profile_image_url_camel]),
            created_at: first([raw.created_at, raw.created_at_camel]),
        }
    }
}

#[derive(Deserialize)]
struct RawComment {
    id: Id,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    user_id: Option<Id>,
    #[serde(default, rename = "userId")]
    user_id_camel: Option<Id>,
    #[serde(default)]
    author_id: Option<Id>,
    #[serde(default)]
    user_nickname: Option<String>,
    #[serde(default, rename = "userNickname")]
    user_nickname_camel: Option<String>,
    #[serde(default)]
    user_nick_name: Option<String>,
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    user_profile_image_url: Option<String>,
    #[serde(default, rename = "userProfileImageUrl")]
    user_profile_image_url_camel: Option<String>,
    #[serde(default)]
    profile_image_url: Option<String>,
    #[serde(default)]
    create_at: Option<String>,
    #[serde(default, rename = "createAt")]
    create_at_camel: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        Self {
            id: raw.id,
            content: raw.content,
            user_id: first([raw.user_id, raw.user_id_camel, raw.author_id]),
            user_nickname: first([
                raw.user_nickname,
                raw.user_nickname_camel,
                raw.user_nick_name,
                raw.nickname,
            ]),
            user_profile_image_url: first([
                raw.user_profile_image_url,
                raw.user_profile_image_url_camel,
                raw.profile_image_url,
            ]),
            create_at: first([raw.create_at, raw.create_at_camel, raw.created_at]),
        }
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<D> {
    #[serde(default)]
    pub(crate) message: Option<String>,
    pub(crate) data: Option<D>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(from = "RawPostsData")]
pub(crate) struct PostsData {
    pub(crate) posts: Vec<Post>,
    pub(crate) next_cursor: Option<Cursor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(from = "RawCommentsData")]
pub(crate) struct CommentsData {
    pub(crate) comments: Vec<Comment>,
    pub(crate) next_cursor: Option<Cursor>,
}

#[derive(Deserialize)]
struct RawPostsData {
    #[serde(default)]
    posts: Option<Vec<Post>>,
    #[serde(default)]
    next_cursor: Option<Cursor>,
    #[serde(default, rename = "nextCursor")]
    next_cursor_camel: Option<Cursor>,
}

impl From<RawPostsData> for PostsData {
    fn from(raw: RawPostsData) -> Self {
        Self {
            posts: raw.posts.unwrap_or_default(),
            next_cursor: first([raw.next_cursor, raw.next_cursor_camel]),
        }
    }
}

#[derive(Deserialize)]
struct RawCommentsData {
    #[serde(default)]
    comments: Option<Vec<Comment>>,
    #[serde(default)]
    next_cursor: Option<Cursor>,
    #[serde(default, rename = "nextCursor")]
    next_cursor_camel: Option<Cursor>,
}

impl From<RawCommentsData> for CommentsData {
    fn from(raw: RawCommentsData) -> Self {
        Self {
            comments: raw.comments.unwrap_or_default(),
            next_cursor: first([raw.next_cursor, raw.next_cursor_camel]),
        }
    }
}

/// Only the envelope message, used to describe non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_accepts_string_and_integer() {
        let a: Cursor = serde_json::from_str("\"abc\"").unwrap();
        let b: Cursor = serde_json::from_str("42").unwrap();
        assert_eq!(a, Cursor::from("abc"));
        assert_eq!(b, Cursor::Int(42));
        assert_eq!(b.to_string(), "42");
        assert_eq!(b, Cursor::from("42"));
    }

    #[test]
    fn numeric_cursor_normalization() {
        assert_eq!(Cursor::Int(0).normalize_numeric(), None);
        assert_eq!(Cursor::Int(-3).normalize_numeric(), None);
        assert_eq!(Cursor::Int(7).normalize_numeric(), Some(Cursor::Int(7)));
        assert_eq!(Cursor::from("nope").normalize_numeric(), None);
        assert_eq!(
            Cursor::from("12").normalize_numeric(),
            Some(Cursor::from("12"))
        );
    }

    #[test]
    fn query_omits_missing_cursor() {
        let first = PageRequest {
            cursor: None,
            limit: 10,
        };
        assert_eq!(first.query(), vec![("limit", "10".to_string())]);

        let next = PageRequest {
            cursor: Some(Cursor::Int(5)),
            limit: 10,
        };
        assert_eq!(
            next.query(),
            vec![("limit", "10".to_string()), ("cursor", "5".to_string())]
        );
    }

    #[test]
    fn comment_tolerates_camel_case_fields() {
        let json = r#"{
            "id": 3,
            "content": "hi",
            "userId": 9,
            "userNickname": "haru",
            "userProfileImageUrl": "http://img",
            "createAt": "2024-05-01T10:00:00"
        }"#;
        let comment: Comment = serde_json::from_str(json).unwrap();
        assert_eq!(comment.user_id, Some(Id::Int(9)));
        assert_eq!(comment.user_nickname.as_deref(), Some("haru"));
        assert_eq!(comment.user_profile_image_url.as_deref(), Some("http://img"));
        assert_eq!(comment.create_at.as_deref(), Some("2024-05-01T10:00:00"));
    }

    #[test]
    fn comments_data_reads_camel_case_cursor() {
        let json = r#"{"comments": [], "nextCursor": "c2"}"#;
        let data: CommentsData = serde_json::from_str(json).unwrap();
        assert_eq!(data.next_cursor, Some(Cursor::from("c2")));
    }

    #[test]
    fn post_author_aliases() {
        let json = r#"{"id": "p1", "user_nick_name": "조각"}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.author_nickname.as_deref(), Some("조각"));
        assert_eq!(post.like_count, 0);
    }

    #[test]
    fn duplicate_spellings_take_first_non_null() {
        let json = r#"{
            "id": 4,
            "user_id": null,
            "userId": 12,
            "user_nickname": null,
            "nickname": "haru",
            "create_at": "2024-05-01T10:00:00",
            "createAt": "2099-01-01T00:00:00"
        }"#;
        let comment: Comment = serde_json::from_str(json).unwrap();
        assert_eq!(comment.user_id, Some(Id::Int(12)));
        assert_eq!(comment.user_nickname.as_deref(), Some("haru"));
        assert_eq!(comment.create_at.as_deref(), Some("2024-05-01T10:00:00"));

        let json = r#"{"id": 1, "author_nickname": "a", "userNickname": "b", "likeCount": 3, "like_count": 5}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.author_nickname.as_deref(), Some("a"));
        assert_eq!(post.like_count, 5);
    }

    #[test]
    fn null_counters_read_as_zero() {
        let json = r#"{"id": 1, "like_count": null, "commentCount": null, "view_count": 8}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert_eq!(post.like_count, 0);
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.view_count, 8);
    }

    #[test]
    fn both_cursor_spellings_and_null_lists() {
        let json = r#"{"posts": null, "next_cursor": null, "nextCursor": 7}"#;
        let data: PostsData = serde_json::from_str(json).unwrap();
        assert!(data.posts.is_empty());
        assert_eq!(data.next_cursor, Some(Cursor::Int(7)));

        let json = r#"{"comments": [], "next_cursor": "a", "nextCursor": "b"}"#;
        let data: CommentsData = serde_json::from_str(json).unwrap();
        assert_eq!(data.next_cursor, Some(Cursor::from("a")));
    }
}
