use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::sync::{watch, Mutex};

use crate::models::Cursor;
use crate::pagination::{Items, LoadOutcome, PageState, Phase, Ticket};
use crate::source::PageSource;

/// Read-only view of a feed for whatever renders it. Items are shared with
/// the loader, so taking a snapshot does not copy them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot<T> {
    pub items: Items<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub has_more: bool,
    pub generation: u64,
}

impl<T> FeedSnapshot<T> {
    pub fn is_empty(&self) -> bool {
        !self.loading && self.items.is_empty()
    }

    fn of(state: &PageState<T>) -> Self {
        Self {
            items: state.items().clone(),
            loading: state.is_loading(),
            error: state.error().map(str::to_string),
            has_more: state.has_more(),
            generation: state.generation(),
        }
    }
}

/// Receives each batch as soon as it has been appended.
pub trait RenderSink<T> {
    fn append(&mut self, batch: &[T]);
}

impl<T> RenderSink<T> for () {
    fn append(&mut self, _batch: &[T]) {}
}

impl<T: Clone> RenderSink<T> for Vec<T> {
    fn append(&mut self, batch: &[T]) {
        self.extend_from_slice(batch);
    }
}

struct Inner<S: PageSource> {
    state: PageState<S::Item>,
    source: Arc<S>,
}

/// Infinite-scroll loader over a [`PageSource`].
///
/// Cloning is cheap: clones share one state, so a sentinel, a fill loop and
/// the UI can all drive the same feed. The lock is never held while a page is
/// being fetched.
///
/// Each fetch runs on its own task together with the state update that ends
/// it. Dropping a `load_more` future (a timeout, a lost `select!` branch)
/// only stops waiting; the page still lands and `loading` still clears.
/// Loads must therefore be started from within a tokio runtime.
pub struct FeedLoader<S: PageSource> {
    inner: Arc<Mutex<Inner<S>>>,
    snapshots: Arc<watch::Sender<FeedSnapshot<S::Item>>>,
}

impl<S: PageSource> Clone for FeedLoader<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<S> FeedLoader<S>
where
    S: PageSource + Send + Sync + 'static,
{
    pub fn new(source: S, limit: u32) -> Self {
        let state = PageState::new(limit);
        let (snapshots, _) = watch::channel(FeedSnapshot::of(&state));
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state,
                source: Arc::new(source),
            })),
            snapshots: Arc::new(snapshots),
        }
    }

    /// Notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot<S::Item>> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> FeedSnapshot<S::Item> {
        FeedSnapshot::of(&self.inner.lock().await.state)
    }

    pub async fn has_more(&self) -> bool {
        self.inner.lock().await.state.has_more()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.state.is_loading()
    }

    pub async fn cursor(&self) -> Option<Cursor> {
        self.inner.lock().await.state.cursor().cloned()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.lock().await.state.phase()
    }

    pub async fn source(&self) -> Arc<S> {
        self.inner.lock().await.source.clone()
    }

    pub async fn load_more(&self) -> LoadOutcome {
        self.load_more_into(&mut ()).await
    }

    /// Loads the next page and hands the new batch to `sink`.
    pub async fn load_more_into(&self, sink: &mut impl RenderSink<S::Item>) -> LoadOutcome {
        let started = {
            let mut inner = self.inner.lock().await;
            let ticket = inner.state.begin();
            if ticket.is_some() {
                publish(&self.snapshots, &inner.state);
            }
            ticket.map(|t| (t, inner.source.clone()))
        };
        match started {
            Some((ticket, source)) => self.finish(ticket, source, sink).await,
            None => LoadOutcome::Skipped,
        }
    }

    /// First page of this mount. Further calls are skipped until a reset.
    pub async fn initial_load(&self) -> LoadOutcome {
        self.initial_load_into(&mut ()).await
    }

    pub async fn initial_load_into(&self, sink: &mut impl RenderSink<S::Item>) -> LoadOutcome {
        let started = {
            let mut inner = self.inner.lock().await;
            let ticket = inner.state.begin_initial();
            if ticket.is_some() {
                publish(&self.snapshots, &inner.state);
            }
            ticket.map(|t| (t, inner.source.clone()))
        };
        match started {
            Some((ticket, source)) => self.finish(ticket, source, sink).await,
            None => LoadOutcome::Skipped,
        }
    }

    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state.reset();
        debug!("feed reset to generation {}", inner.state.generation());
        publish(&self.snapshots, &inner.state);
    }

    /// Reset, then fetch the first page again.
    pub async fn reload(&self) -> LoadOutcome {
        self.reset().await;
        self.initial_load().await
    }

    /// Switch to a different feed identity. Pages still in flight for the
    /// previous source are dropped when they arrive.
    pub async fn remount(&self, source: S) {
        let mut inner = self.inner.lock().await;
        inner.source = Arc::new(source);
        inner.state.reset();
        info!("feed remounted at generation {}", inner.state.generation());
        publish(&self.snapshots, &inner.state);
    }

    async fn finish(
        &self,
        ticket: Ticket,
        source: Arc<S>,
        sink: &mut impl RenderSink<S::Item>,
    ) -> LoadOutcome {
        // No await between `begin` and the spawn below, so a dropped caller
        // cannot strand the ticket.
        let request = ticket.request();
        debug!("fetching page {:?}", request);
        let task = tokio::spawn({
            let inner = self.inner.clone();
            let snapshots = self.snapshots.clone();
            let ticket = ticket.clone();
            async move {
                let result = source.fetch_page(request).await;
                let mut inner = inner.lock().await;
                let outcome = inner.state.complete(&ticket, result);
                let batch = match &outcome {
                    LoadOutcome::Appended { range, .. } if !range.is_empty() => {
                        inner.state.items().last_batch().cloned()
                    }
                    _ => None,
                };
                if outcome != LoadOutcome::Stale {
                    publish(&snapshots, &inner.state);
                }
                (outcome, batch)
            }
        });

        let (outcome, batch) = match task.await {
            Ok(done) => done,
            Err(err) => {
                error!("page fetch task failed: {}", err);
                let message = err.to_string();
                let mut inner = self.inner.lock().await;
                if inner.state.abandon(&ticket, message.clone()) {
                    publish(&self.snapshots, &inner.state);
                    (LoadOutcome::Failed(message), None)
                } else {
                    (LoadOutcome::Stale, None)
                }
            }
        };

        match &outcome {
            LoadOutcome::Appended { range, exhausted } => {
                debug!("appended {} items", range.len());
                if *exhausted {
                    info!("feed exhausted after {} items", range.end);
                }
                if let Some(batch) = batch {
                    sink.append(&batch);
                }
            }
            LoadOutcome::Failed(message) => warn!("page load failed: {}", message),
            LoadOutcome::Stale => debug!(
                "dropping response from generation {}",
                ticket.generation()
            ),
            LoadOutcome::Skipped => (),
        }
        outcome
    }
}

fn publish<T>(snapshots: &watch::Sender<FeedSnapshot<T>>, state: &PageState<T>) {
    snapshots.send_replace(FeedSnapshot::of(state));
}
