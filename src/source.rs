use crate::error::FetchError;
use crate::models::{Page, PageRequest};

/// Fetches one page of a cursor-paginated resource.
pub trait PageSource {
    type Item: Clone + Send + Sync + 'static;

    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl std::future::Future<Output = Result<Page<Self::Item>, FetchError>> + Send;
}

/// A source scoped to one feed identity, such as the post a comment list belongs to.
pub trait KeyedSource: PageSource + Sized {
    type Key: Clone + PartialEq + std::fmt::Debug + Send + Sync;

    fn key(&self) -> &Self::Key;

    /// The same source pointed at a different identity.
    fn with_key(&self, key: Self::Key) -> Self;
}
