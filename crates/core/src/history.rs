//! History record model: the backend's nested audit-trail payload and the
//! canonical flattened record shape used for display, filtering, and export.
//!
//! The backend bundles zero or many discrete events per record (`events`)
//! next to a free-text legacy summary (`event`) kept for older rows. The
//! flattener fans multi-event records out so every flattened record wraps
//! at most one event; [`HistoryRecord::event_summary`] and
//! [`HistoryRecord::context_path`] are the derived-field accessors all
//! downstream consumers go through.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{parse_timestamp, Timestamp};

// ---------------------------------------------------------------------------
// Entity kinds
// ---------------------------------------------------------------------------

/// The entity a history record belongs to (`table_name` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Ppap,
    Phase,
    Output,
    Document,
    Team,
    Person,
    User,
}

impl EntityKind {
    /// String representation for display, filtering, and CSV export.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Ppap => "ppap",
            Self::Phase => "phase",
            Self::Output => "output",
            Self::Document => "document",
            Self::Team => "team",
            Self::Person => "person",
            Self::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "ppap" => Ok(Self::Ppap),
            "phase" => Ok(Self::Phase),
            "output" => Ok(Self::Output),
            "document" => Ok(Self::Document),
            "team" => Ok(Self::Team),
            "person" => Ok(Self::Person),
            "user" => Ok(Self::User),
            other => Err(CoreError::UnknownEntityKind(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw payload records
// ---------------------------------------------------------------------------

/// One discrete audit event (e.g. an update or an approval).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    /// Event kind, e.g. `"update"` or `"approve"`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Human-readable description of what happened.
    pub details: String,
    /// Event-level timestamp, when the backend recorded one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// User who triggered the event, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

/// A history record as the backend ships it, before flattening.
///
/// `event` is the free-text legacy summary, `events` the structured list;
/// either may be missing on any given row. Fields the model does not
/// interpret are preserved verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<HistoryEvent>>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Nested payload tree
// ---------------------------------------------------------------------------

/// One project's nested history payload.
///
/// Every node carries its own `history` list. The PPAP branch is four
/// levels deep (ppap → phase → output → document); the team branch and the
/// flat user list sit parallel to it. Missing branches are valid and
/// simply contribute zero records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NestedHistory {
    #[serde(default)]
    pub project: Vec<RawRecord>,
    #[serde(default)]
    pub ppap: Option<PpapBranch>,
    #[serde(default)]
    pub team: Option<TeamBranch>,
    #[serde(default)]
    pub users: Vec<UserNode>,
}

/// PPAP node: its own history plus phases keyed by phase id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PpapBranch {
    #[serde(default)]
    pub history: Vec<RawRecord>,
    #[serde(default)]
    pub phases: BTreeMap<String, PhaseNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub history: Vec<RawRecord>,
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub history: Vec<RawRecord>,
    #[serde(default)]
    pub documents: BTreeMap<String, DocumentNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub history: Vec<RawRecord>,
}

/// Team node: its own history plus members keyed by person id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamBranch {
    #[serde(default)]
    pub history: Vec<RawRecord>,
    #[serde(default)]
    pub persons: BTreeMap<String, PersonNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub history: Vec<RawRecord>,
}

/// Application user with their own flat history list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub history: Vec<RawRecord>,
}

// ---------------------------------------------------------------------------
// Flattened records
// ---------------------------------------------------------------------------

/// Shown when a record carries neither a structured event nor a legacy summary.
pub const NO_EVENT_DETAILS: &str = "No event details";

/// Separator between ancestry segments in a context path.
pub const CONTEXT_SEPARATOR: &str = " → ";

/// A single flattened history record, contextualized with the labels of
/// the entity that owns it and of its ancestry.
///
/// After flattening, `events` holds at most one event; `total_events`
/// remembers how many the original record bundled so the display layer can
/// annotate fanned-out rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRecord {
    pub id: String,
    /// Human label of the owning entity.
    pub title: String,
    /// The owning entity's own name (leaf-level identity).
    pub source_name: String,
    /// Nearest ancestor label, present only when depth > 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    /// Second-nearest ancestor label, present only when depth > 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grandparent_name: Option<String>,
    pub table_name: EntityKind,
    /// Legacy free-text summary carried over from the raw record.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub event: String,
    /// At most one structured event after fan-out.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<HistoryEvent>,
    /// Structured event count of the original record, pre-fan-out.
    pub total_events: usize,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Backend fields the model does not interpret, passed through verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Display strings derived from a record's event payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    /// Primary text for the event column.
    pub event_text: String,
    /// `"+n more events"` annotation when the original record bundled more
    /// than one event.
    pub details_text: Option<String>,
}

impl HistoryRecord {
    /// Event column text plus the fan-out annotation.
    ///
    /// Records without structured events fall back to the legacy `event`
    /// summary, or to [`NO_EVENT_DETAILS`] when that is empty too.
    pub fn event_summary(&self) -> EventSummary {
        if let Some(event) = self.events.first() {
            let details_text = if self.total_events > 1 {
                Some(format!("+{} more events", self.total_events - 1))
            } else {
                None
            };
            return EventSummary {
                event_text: event.details.clone(),
                details_text,
            };
        }

        let event_text = if self.event.is_empty() {
            NO_EVENT_DETAILS.to_string()
        } else {
            self.event.clone()
        };
        EventSummary {
            event_text,
            details_text: None,
        }
    }

    /// Breadcrumb path `grandparent → parent → source`, available segments
    /// only. Records with no ancestry at all yield an empty string.
    pub fn context_path(&self) -> String {
        if self.parent_name.is_none() && self.grandparent_name.is_none() {
            return String::new();
        }

        let mut segments: Vec<&str> = Vec::with_capacity(3);
        if let Some(grandparent) = self.grandparent_name.as_deref() {
            segments.push(grandparent);
        }
        if let Some(parent) = self.parent_name.as_deref() {
            segments.push(parent);
        }
        segments.push(&self.source_name);
        segments.join(CONTEXT_SEPARATOR)
    }

    /// Parsed `created_at`, or `None` when the backend value is unparsable.
    pub fn parsed_created_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.created_at)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
