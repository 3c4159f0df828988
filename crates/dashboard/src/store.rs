//! Dashboard state holder for the history views.
//!
//! Owns the flattened record list, the filter values, the pagination
//! state, and the error banner, with reducer-style transitions. Fetching
//! itself is the caller's job: the store hands out a ticket per fetch and
//! applies whichever response carries the newest ticket (last-write-wins),
//! so racing page changes settle deterministically. A winning response
//! replaces the record list wholesale -- there is no merging across pages.

use apqp_client::HistoryPage;
use apqp_core::export::to_csv;
use apqp_core::filter::{filter_options, DateBucket, FilterOptions, HistoryFilter};
use apqp_core::history::{EntityKind, HistoryRecord};
use apqp_core::pagination::{PageRequest, PageState};
use apqp_core::types::Timestamp;

// ---------------------------------------------------------------------------
// Fetch tickets
// ---------------------------------------------------------------------------

/// Handle for one in-flight fetch, ordered by issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    seq: u64,
    request: PageRequest,
}

impl FetchTicket {
    /// The page request this ticket was issued for.
    pub fn request(&self) -> PageRequest {
        self.request
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// State holder for one history view instance.
#[derive(Debug, Default)]
pub struct DashboardStore {
    records: Vec<HistoryRecord>,
    filter: HistoryFilter,
    pages: PageState,
    error: Option<String>,
    issued_seq: u64,
    settled_seq: u64,
}

impl DashboardStore {
    /// Fresh store on page 1.
    pub fn new(page_size: u32) -> Self {
        Self {
            pages: PageState::new(page_size),
            ..Self::default()
        }
    }

    /// Fresh store starting on an arbitrary page.
    pub fn with_initial_page(page: u32, page_size: u32) -> Self {
        Self {
            pages: PageState::with_page(page, page_size),
            ..Self::default()
        }
    }

    // -- fetch lifecycle ----------------------------------------------------

    /// Issue a ticket for a fetch of the current page request.
    ///
    /// Tickets are never queued or throttled; starting a new fetch while
    /// another is in flight is allowed and the newest settled ticket wins.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued_seq += 1;
        FetchTicket {
            seq: self.issued_seq,
            request: self.pages.request(),
        }
    }

    /// Apply a successful response.
    ///
    /// Returns `false` (and changes nothing) when a response with a newer
    /// ticket has already settled. Otherwise replaces the record list,
    /// records the backend totals, and clears any error banner.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, page: &HistoryPage) -> bool {
        if !self.settle(ticket) {
            return false;
        }

        self.records = page.flatten();
        self.pages.record_totals(page.total, page.pages);
        self.error = None;

        tracing::debug!(
            records = self.records.len(),
            page = self.pages.page(),
            total_pages = self.pages.total_pages(),
            "History page applied",
        );
        true
    }

    /// Apply a failed fetch: store the error banner and clear the records
    /// so the view shows zero rows. Same staleness rule as
    /// [`complete_fetch`](Self::complete_fetch).
    pub fn fail_fetch(&mut self, ticket: FetchTicket, message: impl Into<String>) -> bool {
        if !self.settle(ticket) {
            return false;
        }

        let message = message.into();
        tracing::warn!(error = %message, "History fetch failed");
        self.error = Some(message);
        self.records.clear();
        true
    }

    fn settle(&mut self, ticket: FetchTicket) -> bool {
        if ticket.seq <= self.settled_seq {
            tracing::debug!(seq = ticket.seq, "Discarding stale history response");
            return false;
        }
        self.settled_seq = ticket.seq;
        true
    }

    /// Whether the newest issued fetch has not settled yet.
    pub fn is_loading(&self) -> bool {
        self.issued_seq > self.settled_seq
    }

    // -- pagination ---------------------------------------------------------

    /// Move to `page`; a ticket is issued only when the (clamped)
    /// transition actually changed the request.
    pub fn set_page(&mut self, page: u32) -> Option<FetchTicket> {
        if self.pages.set_page(page) {
            Some(self.begin_fetch())
        } else {
            None
        }
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if self.pages.next_page() {
            Some(self.begin_fetch())
        } else {
            None
        }
    }

    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        if self.pages.prev_page() {
            Some(self.begin_fetch())
        } else {
            None
        }
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Option<FetchTicket> {
        if self.pages.set_page_size(page_size) {
            Some(self.begin_fetch())
        } else {
            None
        }
    }

    // -- filters ------------------------------------------------------------

    /// Replace all filter values at once (used when seeding from config).
    pub fn set_filter(&mut self, filter: HistoryFilter) {
        self.filter = filter;
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    pub fn set_table(&mut self, table: Option<EntityKind>) {
        self.filter.table = table;
    }

    pub fn set_user(&mut self, user: Option<String>) {
        self.filter.user = user;
    }

    pub fn set_event_type(&mut self, event_type: Option<String>) {
        self.filter.event_type = event_type;
    }

    pub fn set_date_bucket(&mut self, bucket: DateBucket) {
        self.filter.date_bucket = bucket;
    }

    // -- reads --------------------------------------------------------------

    /// The full loaded (unfiltered) record list, newest first.
    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Records passing the current filters, recomputed on every call.
    pub fn visible(&self, now: Timestamp) -> Vec<&HistoryRecord> {
        self.filter.apply(&self.records, now)
    }

    /// Dropdown options derived from the loaded (unfiltered) set.
    pub fn filter_options(&self) -> FilterOptions {
        filter_options(&self.records)
    }

    /// CSV serialization of the currently visible set.
    pub fn export_csv(&self, now: Timestamp) -> String {
        to_csv(self.visible(now))
    }

    pub fn filter(&self) -> &HistoryFilter {
        &self.filter
    }

    pub fn page(&self) -> &PageState {
        &self.pages
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
