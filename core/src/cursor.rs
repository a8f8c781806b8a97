//! Paging position of a feed.

use serde::Serialize;

/// Where the feed is in the service's page sequence.
///
/// A fresh cursor has not loaded anything yet and points at page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PagingCursor {
    pub previous_page: Option<u32>,
    pub current_page: u32,
    pub next_page: Option<u32>,
}

impl Default for PagingCursor {
    fn default() -> Self {
        Self {
            previous_page: None,
            current_page: 0,
            next_page: Some(1),
        }
    }
}

impl PagingCursor {
    /// Cursor after receiving `page` out of `pages`.
    pub fn from_page(page: u32, pages: u32) -> Self {
        Self {
            previous_page: page.checked_sub(1).filter(|p| *p >= 1),
            current_page: page,
            next_page: (page < pages).then(|| page + 1),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }
}
