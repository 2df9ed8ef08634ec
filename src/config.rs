use std::env;

use anyhow::{Context, Result};
use dotenv::dotenv;

use crate::client::Session;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_POSTS_LIMIT: u32 = 10;
pub const DEFAULT_COMMENTS_LIMIT: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub session: Session,
    pub posts_limit: u32,
    pub comments_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session: Session::Anonymous,
            posts_limit: DEFAULT_POSTS_LIMIT,
            comments_limit: DEFAULT_COMMENTS_LIMIT,
        }
    }
}

impl Config {
    /// Reads `.env` if there is one, then the process environment.
    ///
    /// - `HARU_API_BASE_URL`
    /// - `HARU_ACCESS_TOKEN` (optional, anonymous without it)
    /// - `HARU_POSTS_LIMIT`, `HARU_COMMENTS_LIMIT`
    pub fn load_env_config() -> Result<Self> {
        // A missing .env is fine, the variables may come from the shell.
        let _ = dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        Ok(Config {
            api_base_url: lookup("HARU_API_BASE_URL").unwrap_or(defaults.api_base_url),
            session: Session::from_token(lookup("HARU_ACCESS_TOKEN")),
            posts_limit: parse_limit(&lookup, "HARU_POSTS_LIMIT", defaults.posts_limit)?,
            comments_limit: parse_limit(&lookup, "HARU_COMMENTS_LIMIT", defaults.comments_limit)?,
        })
    }
}

fn parse_limit(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> Result<u32> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let limit = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("{key} must be a positive integer, got {raw:?}"))?;
    anyhow::ensure!(limit > 0, "{key} must be greater than zero");
    Ok(limit)
}
