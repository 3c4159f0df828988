//! Filter engine: composable predicates over the flattened record list.
//!
//! All filters are conjunctive. Filtering is a pure function of the
//! current record list, the filter values, and an explicit `now`, so the
//! view layer can recompute it on every dependency change without caching
//! anything.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, Months};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::history::{EntityKind, HistoryRecord};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Date buckets
// ---------------------------------------------------------------------------

/// Relative date window, evaluated against `now` at filter time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateBucket {
    #[default]
    All,
    Today,
    Yesterday,
    LastWeek,
    LastMonth,
}

impl DateBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::LastWeek => "last_week",
            Self::LastMonth => "last_month",
        }
    }

    /// Whether `created_at` falls inside this bucket relative to `now`.
    ///
    /// `today` and `yesterday` compare UTC calendar days; `last_week`
    /// (now − 7 days) and `last_month` (now − 1 month) are rolling windows,
    /// inclusive at the cutoff with no upper bound. Records whose timestamp
    /// cannot be parsed only match the `all` bucket.
    fn contains(self, created_at: Option<Timestamp>, now: Timestamp) -> bool {
        if self == Self::All {
            return true;
        }
        let Some(ts) = created_at else {
            return false;
        };

        match self {
            Self::All => true,
            Self::Today => ts.date_naive() == now.date_naive(),
            Self::Yesterday => now
                .checked_sub_days(Days::new(1))
                .is_some_and(|yesterday| ts.date_naive() == yesterday.date_naive()),
            Self::LastWeek => now
                .checked_sub_days(Days::new(7))
                .is_some_and(|cutoff| ts >= cutoff),
            Self::LastMonth => now
                .checked_sub_months(Months::new(1))
                .is_some_and(|cutoff| ts >= cutoff),
        }
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateBucket {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "today" => Ok(Self::Today),
            "yesterday" => Ok(Self::Yesterday),
            "last_week" => Ok(Self::LastWeek),
            "last_month" => Ok(Self::LastMonth),
            other => Err(CoreError::UnknownDateBucket(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter values
// ---------------------------------------------------------------------------

/// Current values of the five dashboard filters.
///
/// `None` (and [`DateBucket::All`]) correspond to the `"all"` sentinel of
/// the dropdowns; the default filter matches every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    /// Case-insensitive free-text search over labels and event details.
    pub search: String,
    pub table: Option<EntityKind>,
    pub user: Option<String>,
    pub event_type: Option<String>,
    pub date_bucket: DateBucket,
}

impl HistoryFilter {
    /// Whether a record passes every active filter (conjunctive AND).
    pub fn matches(&self, record: &HistoryRecord, now: Timestamp) -> bool {
        self.matches_search(record)
            && self.table.map_or(true, |table| record.table_name == table)
            && self.matches_user(record)
            && self.matches_event_type(record)
            && self
                .date_bucket
                .contains(record.parsed_created_at(), now)
    }

    /// Apply the filter to a record slice, preserving order.
    pub fn apply<'a>(
        &self,
        records: &'a [HistoryRecord],
        now: Timestamp,
    ) -> Vec<&'a HistoryRecord> {
        records
            .iter()
            .filter(|record| self.matches(record, now))
            .collect()
    }

    fn matches_search(&self, record: &HistoryRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let matches_field = |field: &str| field.to_lowercase().contains(&needle);

        matches_field(&record.title)
            || matches_field(&record.source_name)
            || record
                .parent_name
                .as_deref()
                .is_some_and(|parent| matches_field(parent))
            || record
                .grandparent_name
                .as_deref()
                .is_some_and(|grandparent| matches_field(grandparent))
            || record.events.iter().any(|event| matches_field(&event.details))
    }

    fn matches_user(&self, record: &HistoryRecord) -> bool {
        let Some(user) = self.user.as_deref() else {
            return true;
        };
        record.created_by.as_deref() == Some(user)
            || record
                .events
                .iter()
                .any(|event| event.user.as_deref() == Some(user))
    }

    fn matches_event_type(&self, record: &HistoryRecord) -> bool {
        let Some(event_type) = self.event_type.as_deref() else {
            return true;
        };
        record.events.iter().any(|event| event.event_type == event_type)
    }
}

// ---------------------------------------------------------------------------
// Dropdown options
// ---------------------------------------------------------------------------

/// The value shown first in every dropdown, meaning "no filtering".
pub const ALL_SENTINEL: &str = "all";

/// Distinct values available for the table / user / event-type dropdowns,
/// derived from the currently loaded (unfiltered) record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub tables: Vec<String>,
    pub users: Vec<String>,
    pub event_types: Vec<String>,
}

/// Collect dropdown options from the loaded records.
///
/// Each list starts with the `"all"` sentinel; the rest keeps first-seen
/// order. Users come from both `created_by` and per-event attribution.
pub fn filter_options(records: &[HistoryRecord]) -> FilterOptions {
    let mut options = FilterOptions {
        tables: vec![ALL_SENTINEL.to_string()],
        users: vec![ALL_SENTINEL.to_string()],
        event_types: vec![ALL_SENTINEL.to_string()],
    };

    for record in records {
        push_unique(&mut options.tables, record.table_name.as_str());
        if let Some(user) = record.created_by.as_deref() {
            push_unique(&mut options.users, user);
        }
        for event in &record.events {
            if let Some(user) = event.user.as_deref() {
                push_unique(&mut options.users, user);
            }
            push_unique(&mut options.event_types, &event.event_type);
        }
    }

    options
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if value.is_empty() {
        return;
    }
    if !list.iter().any(|existing| existing == value) {
        list.push(value.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
