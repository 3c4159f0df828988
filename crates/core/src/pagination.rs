//! Pagination state for the history dashboard.
//!
//! Tracks the 1-based page, the page size, and the backend-reported
//! totals, and decides when a page transition warrants a new fetch.
//! Fetching itself lives with the caller: this state only hands out the
//! request parameters for the page it wants next.

use serde::Serialize;

/// Default page size used by the dashboard views.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Query parameters for one backend page fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

/// Pagination state: the current request plus backend-reported totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    page: u32,
    page_size: u32,
    total_pages: u32,
    total_records: u64,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    /// Fresh state on page 1. A zero `page_size` is bumped to 1.
    pub fn new(page_size: u32) -> Self {
        Self::with_page(1, page_size)
    }

    /// Fresh state starting on an arbitrary page.
    ///
    /// Totals are provisional until the first response records real ones,
    /// so the starting page also seeds `total_pages` -- transitions stay
    /// clamped without blocking the configured entry point.
    pub fn with_page(page: u32, page_size: u32) -> Self {
        let page = page.max(1);
        Self {
            page,
            page_size: page_size.max(1),
            total_pages: page,
            total_records: 0,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// The request to issue for the current state.
    pub fn request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }

    /// Move to `page`, clamped to `[1, total_pages]`.
    ///
    /// Returns whether the current page actually changed. Out-of-range
    /// requests clamp to the nearest bound, so asking for a page past the
    /// end while already on the last page changes nothing and must not
    /// trigger a duplicate fetch.
    pub fn set_page(&mut self, page: u32) -> bool {
        let clamped = page.clamp(1, self.max_page());
        if clamped == self.page {
            return false;
        }
        self.page = clamped;
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.set_page(self.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> bool {
        self.set_page(self.page.saturating_sub(1))
    }

    /// Change the page size and reset to the first page. No-op when the
    /// size is unchanged.
    pub fn set_page_size(&mut self, page_size: u32) -> bool {
        let page_size = page_size.max(1);
        if page_size == self.page_size {
            return false;
        }
        self.page_size = page_size;
        self.page = 1;
        true
    }

    /// Record totals from a backend response, re-clamping the current page
    /// if the total shrank below it.
    pub fn record_totals(&mut self, total_records: u64, total_pages: u32) {
        self.total_records = total_records;
        self.total_pages = total_pages;
        self.page = self.page.clamp(1, self.max_page());
    }

    fn max_page(&self) -> u32 {
        self.total_pages.max(1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_pages(total_pages: u32) -> PageState {
        let mut state = PageState::new(20);
        state.record_totals(u64::from(total_pages) * 20, total_pages);
        state
    }

    #[test]
    fn starts_on_page_one() {
        let state = PageState::default();
        assert_eq!(state.page(), 1);
        assert_eq!(state.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(state.request(), PageRequest { page: 1, page_size: 20 });
    }

    #[test]
    fn page_past_the_end_clamps_to_last_page() {
        let mut state = state_with_pages(5);
        assert!(state.set_page(6));
        assert_eq!(state.page(), 5);
    }

    #[test]
    fn page_past_the_end_while_on_last_page_issues_no_fetch() {
        let mut state = state_with_pages(5);
        state.set_page(5);
        assert!(!state.set_page(6));
        assert_eq!(state.page(), 5);
    }

    #[test]
    fn next_page_stops_at_the_last_page() {
        let mut state = state_with_pages(2);
        assert!(state.next_page());
        assert_eq!(state.page(), 2);
        assert!(!state.next_page());
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn prev_page_stops_at_page_one() {
        let mut state = state_with_pages(2);
        assert!(!state.prev_page());
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn page_zero_clamps_to_one() {
        let mut state = state_with_pages(3);
        state.set_page(2);
        assert!(state.set_page(0));
        assert_eq!(state.page(), 1);
    }

    #[test]
    fn shrinking_totals_reclamps_the_current_page() {
        let mut state = state_with_pages(10);
        state.set_page(9);
        state.record_totals(40, 2);
        assert_eq!(state.page(), 2);
    }

    #[test]
    fn set_page_size_resets_to_first_page() {
        let mut state = state_with_pages(10);
        state.set_page(4);
        assert!(state.set_page_size(50));
        assert_eq!(state.page(), 1);
        assert_eq!(state.page_size(), 50);
    }

    #[test]
    fn unchanged_page_size_is_a_noop() {
        let mut state = state_with_pages(10);
        state.set_page(4);
        assert!(!state.set_page_size(20));
        assert_eq!(state.page(), 4);
    }

    #[test]
    fn zero_page_size_is_bumped_to_one() {
        let state = PageState::new(0);
        assert_eq!(state.page_size(), 1);
    }

    #[test]
    fn with_page_seeds_provisional_totals() {
        let mut state = PageState::with_page(3, 20);
        assert_eq!(state.page(), 3);
        assert_eq!(state.total_pages(), 3);

        state.record_totals(100, 5);
        assert_eq!(state.page(), 3);
        assert_eq!(state.total_pages(), 5);
    }
}
