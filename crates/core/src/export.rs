//! CSV export of the filtered record set.
//!
//! Field escaping follows RFC 4180: values containing a comma, a double
//! quote, or a line break are wrapped in double quotes with inner quotes
//! doubled. Header row and column order are fixed.

use chrono::NaiveDate;

use crate::history::HistoryRecord;
use crate::types::format_timestamp;

/// Column headers, in output order.
pub const CSV_HEADERS: [&str; 7] = [
    "Title",
    "Event",
    "Event Type",
    "Table",
    "User",
    "Date & Time",
    "Context Path",
];

/// Placeholder for a record without a structured event type.
const UNKNOWN: &str = "unknown";

/// Attribution for records with neither a creator nor an event user.
const SYSTEM_USER: &str = "System";

/// Serialize records to CSV, header row first.
///
/// Works on the already-filtered visible set; callers pass whatever slice
/// the view currently shows.
pub fn to_csv<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a HistoryRecord>,
{
    let mut lines = vec![CSV_HEADERS.join(",")];

    for record in records {
        let summary = record.event_summary();
        let event_type = record
            .events
            .first()
            .map_or(UNKNOWN, |event| event.event_type.as_str());
        let user = record
            .created_by
            .as_deref()
            .or_else(|| record.events.first().and_then(|event| event.user.as_deref()))
            .unwrap_or(SYSTEM_USER);

        let fields = [
            escape_field(&record.title),
            escape_field(&summary.event_text),
            escape_field(event_type),
            escape_field(record.table_name.as_str()),
            escape_field(user),
            escape_field(&format_timestamp(&record.created_at)),
            escape_field(&record.context_path()),
        ];
        lines.push(fields.join(","));
    }

    lines.push(String::new());
    lines.join("\n")
}

/// File name for an export performed on `date`, e.g.
/// `history-export-2023-06-15.csv`.
pub fn export_filename(date: NaiveDate) -> String {
    format!("history-export-{}.csv", date.format("%Y-%m-%d"))
}

/// Quote a field when it contains a comma, quote, or line break, doubling
/// any inner quotes.
fn escape_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
