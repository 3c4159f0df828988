//! Plain-text rendering of the visible record set.
//!
//! Pure functions of the record slice; printing is left to the caller.

use apqp_core::history::HistoryRecord;
use apqp_core::pagination::PageState;
use apqp_core::types::format_timestamp;

const DATE_WIDTH: usize = 20;
const TABLE_WIDTH: usize = 8;
const TITLE_WIDTH: usize = 24;
const EVENT_WIDTH: usize = 36;
const USER_WIDTH: usize = 12;

/// Render the visible records as a fixed-width table, header first.
pub fn render_table(records: &[&HistoryRecord]) -> String {
    let mut lines = vec![format!(
        "{:<DATE_WIDTH$}  {:<TABLE_WIDTH$}  {:<TITLE_WIDTH$}  {:<EVENT_WIDTH$}  {:<USER_WIDTH$}  {}",
        "Date & Time", "Table", "Title", "Event", "User", "Context"
    )];

    for record in records {
        let summary = record.event_summary();
        let event_text = match &summary.details_text {
            Some(annotation) => format!("{} ({annotation})", summary.event_text),
            None => summary.event_text,
        };
        let user = record
            .created_by
            .as_deref()
            .or_else(|| record.events.first().and_then(|event| event.user.as_deref()))
            .unwrap_or("System");

        lines.push(format!(
            "{:<DATE_WIDTH$}  {:<TABLE_WIDTH$}  {:<TITLE_WIDTH$}  {:<EVENT_WIDTH$}  {:<USER_WIDTH$}  {}",
            truncate(&format_timestamp(&record.created_at), DATE_WIDTH),
            record.table_name.as_str(),
            truncate(&record.title, TITLE_WIDTH),
            truncate(&event_text, EVENT_WIDTH),
            truncate(user, USER_WIDTH),
            record.context_path(),
        ));
    }

    lines.join("\n")
}

/// One-line footer: how much of the loaded page is visible, and where the
/// page sits in the overall result set.
pub fn render_summary(shown: usize, loaded: usize, pages: &PageState) -> String {
    format!(
        "{shown} of {loaded} records shown -- page {} of {} ({} total)",
        pages.page(),
        pages.total_pages(),
        pages.total_records(),
    )
}

/// Truncate to `width` characters, ellipsized.
fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use apqp_core::history::EntityKind;
    use apqp_core::pagination::PageState;

    fn record(title: &str) -> HistoryRecord {
        HistoryRecord {
            id: "r1".into(),
            title: title.into(),
            source_name: title.into(),
            parent_name: Some("PPAP".into()),
            grandparent_name: None,
            table_name: EntityKind::Phase,
            event: "updated".into(),
            events: Vec::new(),
            total_events: 0,
            created_at: "2023-01-05T15:04:00Z".into(),
            created_by: Some("ada".into()),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn table_starts_with_a_header() {
        let rendered = render_table(&[]);
        assert!(rendered.starts_with("Date & Time"));
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn rows_carry_record_fields() {
        let r = record("Planning");
        let rendered = render_table(&[&r]);
        let row = rendered.lines().nth(1).unwrap();
        assert!(row.contains("Jan 5, 2023 3:04 PM"));
        assert!(row.contains("phase"));
        assert!(row.contains("Planning"));
        assert!(row.contains("updated"));
        assert!(row.contains("ada"));
        assert!(row.contains("PPAP → Planning"));
    }

    #[test]
    fn long_values_are_ellipsized() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abcd", 4), "abcd");
    }

    #[test]
    fn summary_reports_page_position() {
        let mut pages = PageState::new(20);
        pages.record_totals(57, 3);
        assert_eq!(
            render_summary(4, 20, &pages),
            "4 of 20 records shown -- page 1 of 3 (57 total)"
        );
    }
}
