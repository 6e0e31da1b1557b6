//! Pagination state machine.
//!
//! - `Local`: every matching item is already held; paging slices an array.
//! - `Remote`: the server holds the result set; paging asks for another page.

use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageMode {
    Local,
    Remote,
}

/// What the caller has to do after a page move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMove {
    /// Show this slice of the locally held items.
    Slice(Range<usize>),
    /// Re-query the server for this page.
    Fetch(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    mode: PageMode,
    page: u32,
    page_size: u32,
    total: usize,
}

impl Pager {
    pub fn new(page_size: u32) -> Self {
        Self {
            mode: PageMode::Local,
            page: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn mode(&self) -> PageMode {
        self.mode
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn enter(&mut self, mode: PageMode) {
        self.mode = mode;
    }

    pub fn set_page_size(&mut self, page_size: u32) {
        self.page_size = page_size.max(1);
    }

    /// Update the total. A local page past the end is pulled back to the
    /// last page.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        if self.mode == PageMode::Local {
            self.page = self.page.min(self.last_page());
        }
    }

    /// Page reported by the server for the current remote result.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Back to page 1. Called on every filter change.
    pub fn reset(&mut self) {
        self.page = 1;
    }

    pub fn last_page(&self) -> u32 {
        let size = self.page_size as usize;
        let pages = self.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize) * (self.page_size as usize) < self.total
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn next(&mut self) -> Option<PageMove> {
        if !self.has_next() {
            return None;
        }
        Some(self.step_to(self.page + 1))
    }

    pub fn prev(&mut self) -> Option<PageMove> {
        if !self.has_prev() {
            return None;
        }
        Some(self.step_to(self.page - 1))
    }

    fn step_to(&mut self, page: u32) -> PageMove {
        match self.mode {
            PageMode::Local => {
                self.page = page;
                PageMove::Slice(self.range())
            }
            // The page number moves once the server answers.
            PageMode::Remote => PageMove::Fetch(page),
        }
    }

    /// Bounds of the current page within a locally held set.
    pub fn range(&self) -> Range<usize> {
        let size = self.page_size as usize;
        let start = ((self.page as usize).saturating_sub(1) * size).min(self.total);
        let end = (start + size).min(self.total);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let r = self.range();
        let end = r.end.min(items.len());
        let start = r.start.min(end);
        &items[start..end]
    }
}
