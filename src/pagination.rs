//! Cursor pagination state, independent of any transport or UI.
//!
//! A load is split in two halves so the caller can await the network without
//! holding the state: [`PageState::begin`] hands out a [`Ticket`] and
//! [`PageState::complete`] applies the result. Tickets carry the generation
//! they were issued under; [`PageState::reset`] bumps the generation so that
//! any response still in flight is discarded when it lands.

use std::fmt;
use std::ops::{Index, Range};
use std::sync::Arc;

use crate::error::FetchError;
use crate::models::{Cursor, Page, PageRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Exhausted,
}

/// Proof that a fetch was started, and the request it should send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    cursor: Option<Cursor>,
    limit: u32,
}

impl Ticket {
    pub fn request(&self) -> PageRequest {
        PageRequest {
            cursor: self.cursor.clone(),
            limit: self.limit,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A fetch was already running or the feed is exhausted.
    Skipped,
    /// Items were appended at `range`; `exhausted` is true if this was the last page.
    Appended {
        range: Range<usize>,
        exhausted: bool,
    },
    Failed(String),
    /// The state was reset while the fetch was in flight.
    Stale,
}

/// Loaded items in arrival order, kept as the batches they arrived in.
///
/// Clones share the batches, so copying a long feed costs one pointer per page.
pub struct Items<T> {
    batches: Vec<Arc<[T]>>,
    len: usize,
}

impl<T> Items<T> {
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.batches.iter().flat_map(|batch| batch.iter())
    }

    pub fn batches(&self) -> &[Arc<[T]>] {
        &self.batches
    }

    pub fn last_batch(&self) -> Option<&Arc<[T]>> {
        self.batches.last()
    }

    pub fn get(&self, mut index: usize) -> Option<&T> {
        for batch in &self.batches {
            if index < batch.len() {
                return batch.get(index);
            }
            index -= batch.len();
        }
        None
    }

    fn push_batch(&mut self, batch: Vec<T>) {
        if batch.is_empty() {
            return;
        }
        self.len += batch.len();
        self.batches.push(batch.into());
    }

    fn clear(&mut self) {
        self.batches.clear();
        self.len = 0;
    }
}

impl<T: Clone> Items<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

impl<T> Default for Items<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Items<T> {
    fn clone(&self) -> Self {
        Self {
            batches: self.batches.clone(),
            len: self.len,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Items<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for Items<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: PartialEq> PartialEq<Vec<T>> for Items<T> {
    fn eq(&self, other: &Vec<T>) -> bool {
        self.len == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: PartialEq, const N: usize> PartialEq<[T; N]> for Items<T> {
    fn eq(&self, other: &[T; N]) -> bool {
        self.len == N && self.iter().eq(other.iter())
    }
}

impl<T> Index<usize> for Items<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!("index {index} out of range for {} items", self.len),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageState<T> {
    items: Items<T>,
    cursor: Option<Cursor>,
    has_more: bool,
    loading: bool,
    error: Option<String>,
    limit: u32,
    generation: u64,
    initial_loaded: bool,
}

impl<T> PageState<T> {
    pub fn new(limit: u32) -> Self {
        Self {
            items: Items::new(),
            cursor: None,
            has_more: true,
            loading: false,
            error: None,
            limit,
            generation: 0,
            initial_loaded: false,
        }
    }

    pub fn items(&self) -> &Items<T> {
        &self.items
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if !self.has_more {
            Phase::Exhausted
        } else {
            Phase::Idle
        }
    }

    /// Starts a load unless one is running or the feed is exhausted.
    pub fn begin(&mut self) -> Option<Ticket> {
        if self.loading || !self.has_more {
            return None;
        }
        self.loading = true;
        self.error = None;
        Some(Ticket {
            generation: self.generation,
            cursor: self.cursor.clone(),
            limit: self.limit,
        })
    }

    /// Like [`begin`](Self::begin), but only once per mount.
    pub fn begin_initial(&mut self) -> Option<Ticket> {
        if self.initial_loaded {
            return None;
        }
        self.initial_loaded = true;
        self.begin()
    }

    pub fn complete(
        &mut self,
        ticket: &Ticket,
        result: Result<Page<T>, FetchError>,
    ) -> LoadOutcome {
        if ticket.generation != self.generation {
            return LoadOutcome::Stale;
        }
        self.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(err) => {
                let message = err.to_string();
                self.error = Some(message.clone());
                return LoadOutcome::Failed(message);
            }
        };

        let start = self.items.len();
        let batch_was_empty = page.items.is_empty();
        self.items.push_batch(page.items);
        let range = start..self.items.len();

        match page.next_cursor {
            _ if batch_was_empty => self.has_more = false,
            Some(next) if ticket.cursor.as_ref() == Some(&next) => self.has_more = false,
            None => self.has_more = false,
            Some(next) => {
                self.cursor = Some(next);
                self.has_more = true;
            }
        }

        LoadOutcome::Appended {
            range,
            exhausted: !self.has_more,
        }
    }

    /// Gives up on a fetch that will never complete, e.g. because the task
    /// driving it panicked. Only the load `ticket` started is affected.
    pub fn abandon(&mut self, ticket: &Ticket, message: impl Into<String>) -> bool {
        if ticket.generation != self.generation || !self.loading {
            return false;
        }
        self.loading = false;
        self.error = Some(message.into());
        true
    }

    /// Back to an empty first page. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.items.clear();
        self.cursor = None;
        self.has_more = true;
        self.loading = false;
        self.error = None;
        self.initial_loaded = false;
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: &[&'static str], next: Option<&str>) -> Result<Page<&'static str>, FetchError> {
        Ok(Page {
            items: items.to_vec(),
            next_cursor: next.map(Cursor::from),
        })
    }

    #[test]
    fn begin_is_exclusive_while_loading() {
        let mut state = PageState::<&str>::new(10);
        let ticket = state.begin().unwrap();
        assert_eq!(state.phase(), Phase::Loading);
        assert!(state.begin().is_none());

        state.complete(&ticket, page(&["a"], Some("1")));
        assert!(state.begin().is_some());
    }

    #[test]
    fn first_request_omits_cursor() {
        let mut state = PageState::<&str>::new(20);
        let ticket = state.begin().unwrap();
        assert_eq!(
            ticket.request(),
            PageRequest {
                cursor: None,
                limit: 20
            }
        );
    }

    #[test]
    fn pages_append_in_arrival_order() {
        let mut state = PageState::new(2);
        let t1 = state.begin().unwrap();
        assert_eq!(
            state.complete(&t1, page(&["A", "B"], Some("c1"))),
            LoadOutcome::Appended {
                range: 0..2,
                exhausted: false
            }
        );

        let t2 = state.begin().unwrap();
        assert_eq!(t2.request().cursor, Some(Cursor::from("c1")));
        state.complete(&t2, page(&["C", "D"], Some("c2")));

        assert_eq!(state.items(), &["A", "B", "C", "D"]);
        assert_eq!(state.cursor(), Some(&Cursor::from("c2")));
        assert!(state.has_more());
    }

    #[test]
    fn empty_page_exhausts_even_with_cursor() {
        let mut state = PageState::<&str>::new(10);
        let ticket = state.begin().unwrap();
        let outcome = state.complete(&ticket, page(&[], Some("x")));

        assert_eq!(
            outcome,
            LoadOutcome::Appended {
                range: 0..0,
                exhausted: true
            }
        );
        assert_eq!(state.phase(), Phase::Exhausted);
        assert!(state.begin().is_none());
    }

    #[test]
    fn repeated_cursor_exhausts() {
        let mut state = PageState::new(10);
        let t1 = state.begin().unwrap();
        state.complete(&t1, page(&["a"], Some("5")));

        let t2 = state.begin().unwrap();
        assert_eq!(t2.request().cursor, Some(Cursor::from("5")));
        state.complete(&t2, page(&["b"], Some("5")));

        assert!(!state.has_more());
        assert_eq!(state.items(), &["a", "b"]);
    }

    #[test]
    fn repeated_cursor_matches_across_json_types() {
        let mut state = PageState::new(10);
        let t1 = state.begin().unwrap();
        state.complete(
            &t1,
            Ok(Page {
                items: vec!["a"],
                next_cursor: Some(Cursor::Int(5)),
            }),
        );
        let t2 = state.begin().unwrap();
        state.complete(&t2, page(&["b"], Some("5")));
        assert!(!state.has_more());
    }

    #[test]
    fn missing_next_cursor_exhausts() {
        let mut state = PageState::new(10);
        let ticket = state.begin().unwrap();
        state.complete(&ticket, page(&["a"], None));
        assert!(!state.has_more());
        assert_eq!(state.items(), &["a"]);
    }

    #[test]
    fn failure_keeps_position() {
        let mut state = PageState::new(1);
        for (item, next) in [("a", "1"), ("b", "2")] {
            let ticket = state.begin().unwrap();
            state.complete(&ticket, page(&[item], Some(next)));
        }

        let ticket = state.begin().unwrap();
        let outcome = state.complete(&ticket, Err(FetchError::Other("boom".into())));
        assert_eq!(outcome, LoadOutcome::Failed("boom".into()));
        assert_eq!(state.error(), Some("boom"));
        assert_eq!(state.cursor(), Some(&Cursor::from("2")));
        assert!(state.has_more());
        assert!(!state.is_loading());

        let retry = state.begin().unwrap();
        assert_eq!(retry.request().cursor, Some(Cursor::from("2")));
        assert_eq!(state.error(), None);
    }

    #[test]
    fn reset_makes_outstanding_ticket_stale() {
        let mut state = PageState::new(10);
        let before = state.begin().unwrap();
        state.reset();
        assert!(!state.is_loading());

        let after = state.begin().unwrap();
        assert_eq!(state.complete(&before, page(&["X"], Some("9"))), LoadOutcome::Stale);
        assert!(state.is_loading());
        assert!(state.items().is_empty());

        state.complete(&after, page(&["Y"], Some("1")));
        assert_eq!(state.items(), &["Y"]);
    }

    #[test]
    fn stale_failure_does_not_record_error() {
        let mut state = PageState::<&str>::new(10);
        let before = state.begin().unwrap();
        state.reset();
        let outcome = state.complete(&before, Err(FetchError::Other("late".into())));
        assert_eq!(outcome, LoadOutcome::Stale);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn abandon_only_clears_its_own_generation() {
        let mut state = PageState::<&str>::new(10);
        let before = state.begin().unwrap();
        state.reset();
        let after = state.begin().unwrap();

        assert!(!state.abandon(&before, "gone"));
        assert!(state.is_loading());

        assert!(state.abandon(&after, "gone"));
        assert!(!state.is_loading());
        assert_eq!(state.error(), Some("gone"));
        assert!(state.has_more());
        assert!(state.begin().is_some());
    }

    #[test]
    fn items_share_batches_across_clones() {
        let mut state = PageState::new(2);
        for (batch, next) in [(&["a", "b"][..], "1"), (&["c"][..], "2")] {
            let ticket = state.begin().unwrap();
            state.complete(&ticket, page(batch, Some(next)));
        }

        let copy = state.items().clone();
        assert_eq!(copy.batches().len(), 2);
        assert!(Arc::ptr_eq(&copy.batches()[0], &state.items().batches()[0]));
        assert_eq!(copy.len(), 3);
        assert_eq!(copy[2], "c");
        assert_eq!(copy.get(3), None);
        assert_eq!(copy.to_vec(), vec!["a", "b", "c"]);
    }

    #[test]
    fn initial_load_is_one_shot_until_reset() {
        let mut state = PageState::<&str>::new(10);
        let ticket = state.begin_initial().unwrap();
        state.complete(&ticket, page(&["a"], Some("1")));
        assert!(state.begin_initial().is_none());

        state.reset();
        assert!(state.begin_initial().is_some());
    }
}
