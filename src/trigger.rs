//! Turns "the sentinel is on screen" into page loads.

use log::{debug, info};
use tokio::sync::mpsc;

use crate::loader::{FeedLoader, RenderSink};
use crate::pagination::LoadOutcome;
use crate::source::PageSource;

/// Extra room below the viewport in which the sentinel already counts as
/// visible, so the next page arrives before the user reaches the end.
pub const DEFAULT_ROOT_MARGIN: f64 = 300.0;

/// How far content must exceed the viewport before it counts as scrollable.
pub const SCROLL_SLACK: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityEvent {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerOptions {
    pub root_margin: f64,
}

impl Default for TriggerOptions {
    fn default() -> Self {
        Self {
            root_margin: DEFAULT_ROOT_MARGIN,
        }
    }
}

impl TriggerOptions {
    /// Classifies a sentinel position relative to the bottom edge of the viewport.
    pub fn classify(&self, sentinel_top: f64, viewport_bottom: f64) -> VisibilityEvent {
        if is_near_viewport(sentinel_top, viewport_bottom, self.root_margin) {
            VisibilityEvent::Visible
        } else {
            VisibilityEvent::Hidden
        }
    }
}

pub fn is_near_viewport(sentinel_top: f64, viewport_bottom: f64, margin: f64) -> bool {
    sentinel_top <= viewport_bottom + margin
}

/// Watches visibility events for one feed until the feed runs out.
pub struct Sentinel<S: PageSource> {
    loader: FeedLoader<S>,
    events: mpsc::Receiver<VisibilityEvent>,
}

impl<S> Sentinel<S>
where
    S: PageSource + Send + Sync + 'static,
{
    pub fn new(loader: FeedLoader<S>, events: mpsc::Receiver<VisibilityEvent>) -> Self {
        Self { loader, events }
    }

    /// Runs until the feed is exhausted or the event channel closes. Returns
    /// the number of loads that were attempted.
    pub async fn observe(self) -> usize {
        self.observe_into(&mut ()).await
    }

    pub async fn observe_into(mut self, sink: &mut impl RenderSink<S::Item>) -> usize {
        let mut attempts = 0;
        if !self.loader.has_more().await {
            return attempts;
        }
        while let Some(event) = self.events.recv().await {
            if event != VisibilityEvent::Visible {
                continue;
            }
            if self.loader.load_more_into(&mut *sink).await != LoadOutcome::Skipped {
                attempts += 1;
            }
            if !self.loader.has_more().await {
                info!("sentinel detached, feed exhausted");
                break;
            }
        }
        debug!("sentinel stopped after {} loads", attempts);
        attempts
    }
}

/// Something whose content may or may not overflow its viewport.
pub trait ScrollMetrics {
    fn can_scroll(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollGeometry {
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics for ScrollGeometry {
    fn can_scroll(&self) -> bool {
        self.scroll_height > self.client_height + SCROLL_SLACK
    }
}

/// Keeps loading pages one at a time until `view` can scroll, so the sentinel
/// has somewhere to scroll into. Each load is awaited before the next check,
/// and the loop gives up at the first load that fails or is skipped.
pub async fn fill_until_scrollable<S, V>(loader: &FeedLoader<S>, view: &mut V) -> usize
where
    S: PageSource + Send + Sync + 'static,
    V: RenderSink<S::Item> + ScrollMetrics,
{
    let mut loads = 0;
    while !view.can_scroll() && loader.has_more().await {
        let outcome = loader.load_more_into(&mut *view).await;
        match outcome {
            LoadOutcome::Appended { .. } => loads += 1,
            LoadOutcome::Failed(_) => {
                loads += 1;
                break;
            }
            LoadOutcome::Skipped | LoadOutcome::Stale => break,
        }
    }
    debug!("filled viewport with {} loads", loads);
    loads
}
