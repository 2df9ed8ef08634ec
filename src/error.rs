use thiserror::Error;

/// Why a page could not be fetched.
///
/// The loader treats every variant the same way; the distinction only matters
/// for logging and for callers that talk to [`crate::ApiClient`] directly.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a response.
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The body was not the JSON shape we expect.
    #[error("{message}")]
    Decode {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Fetch failures from sources that are not backed by HTTP.
    #[error("{0}")]
    Other(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
