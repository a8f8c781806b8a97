//! Paginated photo feed state machine.
//!
//! # Design
//! `Feed` owns the feed state and never performs I/O. Every trigger
//! (`load`, `submit_query`, `refresh`, `request_next_page`) either returns
//! `None` (nothing to fetch) or a `PageRequest` stamped with a fresh
//! generation. The driver executes the request and hands the outcome back to
//! `apply` together with that generation.
//!
//! Only the most recently issued generation can change state. A result for
//! any earlier generation is dropped, whether it succeeded or failed, so a
//! slow response that arrives after a newer one is never merged.
//!
//! A load-more trigger while a fetch is in flight is dropped rather than
//! queued; the presentation re-arms it through `support_load_more` once the
//! current fetch settles.

use serde::Serialize;
use tracing::debug;

use crate::cursor::PagingCursor;
use crate::error::ApiError;
use crate::types::{Photo, PhotoPage};

/// How many items from the end of the list the presentation starts asking
/// for the next page.
pub const LOAD_MORE_BUFFER: usize = 10;

/// Coarse phase of a feed, derived from its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedPhase {
    Idle,
    Loading,
    Error,
}

/// Snapshot of everything the presentation renders for a feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedState {
    pub query: String,
    pub photos: Vec<Photo>,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub cursor: PagingCursor,
}

impl FeedState {
    /// Whether the presentation should arm its near-bottom detector.
    pub fn support_load_more(&self) -> bool {
        !self.is_loading && self.cursor.has_next()
    }

    pub fn phase(&self) -> FeedPhase {
        if self.is_loading {
            FeedPhase::Loading
        } else if self.error_message.is_some() {
            FeedPhase::Error
        } else {
            FeedPhase::Idle
        }
    }

    /// Near-bottom detector: true once the last visible item is within
    /// `buffer` items of the end and another page can be loaded.
    pub fn should_load_more(&self, last_visible_index: usize, buffer: usize) -> bool {
        self.support_load_more() && last_visible_index + buffer >= self.photos.len()
    }
}

/// A page fetch the driver must execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub generation: u64,
    /// Empty for the recent-photos listing.
    pub query: String,
    pub page: u32,
}

impl PageRequest {
    pub fn is_search(&self) -> bool {
        !self.query.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Feed {
    state: FeedState,
    generation: u64,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    /// Generation of the most recently issued request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Fetch the next page for the current query, if there is one.
    ///
    /// Used for the initial load of a freshly created feed.
    pub fn load(&mut self) -> Option<PageRequest> {
        self.trigger()
    }

    /// Switch to `text`, or reload it from the top when `is_refresh` is set.
    ///
    /// Re-submitting the current query without `is_refresh` changes nothing.
    pub fn submit_query(&mut self, text: &str, is_refresh: bool) -> Option<PageRequest> {
        if !is_refresh && text == self.state.query {
            debug!(query = text, "ignoring duplicate query submit");
            return None;
        }

        self.state.query = text.to_string();
        self.state.photos.clear();
        self.state.cursor = PagingCursor::default();
        self.trigger()
    }

    /// Pull-to-refresh: reload the current query from page 1.
    pub fn refresh(&mut self) -> Option<PageRequest> {
        let query = self.state.query.clone();
        self.submit_query(&query, true)
    }

    pub fn request_next_page(&mut self) -> Option<PageRequest> {
        if self.state.is_loading {
            debug!("load-more ignored while a page is in flight");
            return None;
        }
        self.trigger()
    }

    /// Apply the outcome of the request stamped `generation`.
    ///
    /// Returns `false` when the result was stale and dropped.
    pub fn apply(&mut self, generation: u64, result: Result<PhotoPage, ApiError>) -> bool {
        if generation != self.generation || !self.state.is_loading {
            debug!(
                generation,
                latest = self.generation,
                "dropping superseded page result"
            );
            return false;
        }

        self.state.is_loading = false;
        match result {
            Ok(page) => {
                self.state.cursor = PagingCursor::from_page(page.page, page.pages);
                self.state.photos.extend(page.photos);
                self.state.error_message = None;
            }
            Err(err) => {
                self.state.error_message = Some(err.message());
            }
        }
        true
    }

    fn trigger(&mut self) -> Option<PageRequest> {
        let page = self.state.cursor.next_page?;
        self.generation += 1;
        self.state.is_loading = true;
        Some(PageRequest {
            generation: self.generation,
            query: self.state.query.clone(),
            page,
        })
    }
}
