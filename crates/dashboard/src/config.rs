//! Dashboard configuration loaded from environment variables.

use std::path::PathBuf;

use apqp_core::filter::{DateBucket, HistoryFilter, ALL_SENTINEL};
use apqp_core::history::EntityKind;
use apqp_core::pagination::DEFAULT_PAGE_SIZE;

/// Configuration for one dashboard run.
///
/// All optional variables have defaults suitable for pointing at a local
/// backend; only the backend URL is required.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend base URL, e.g. `http://localhost:8000/api`.
    pub api_url: String,
    /// Page to fetch (1-based).
    pub page: u32,
    /// Page size for the history endpoint.
    pub page_size: u32,
    /// Initial filter values applied to the fetched page.
    pub filter: HistoryFilter,
    /// When set, the filtered record set is also written here as CSV. A
    /// directory gets a dated `history-export-*.csv` file inside it.
    pub export_path: Option<PathBuf>,
}

/// Errors from reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable           | Required | Default | Description                          |
    /// |--------------------|----------|---------|--------------------------------------|
    /// | `APQP_API_URL`     | yes      | --      | Backend base URL                     |
    /// | `APQP_PAGE`        | no       | `1`     | Page to fetch (1-based)              |
    /// | `APQP_PAGE_SIZE`   | no       | `20`    | Page size                            |
    /// | `APQP_SEARCH`      | no       | empty   | Free-text filter                     |
    /// | `APQP_TABLE`       | no       | `all`   | Table-name filter                    |
    /// | `APQP_USER`        | no       | `all`   | User filter                          |
    /// | `APQP_EVENT_TYPE`  | no       | `all`   | Event-type filter                    |
    /// | `APQP_DATE_BUCKET` | no       | `all`   | today / yesterday / last_week / last_month |
    /// | `APQP_EXPORT_PATH` | no       | --      | CSV output file or directory         |
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url =
            std::env::var("APQP_API_URL").map_err(|_| ConfigError::Missing("APQP_API_URL"))?;

        let page = parse_var("APQP_PAGE", 1)?;
        let page_size = parse_var("APQP_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;

        let filter = HistoryFilter {
            search: std::env::var("APQP_SEARCH").unwrap_or_default(),
            table: match dropdown_value(std::env::var("APQP_TABLE").ok()) {
                Some(value) => Some(value.parse::<EntityKind>().map_err(|e| {
                    ConfigError::Invalid {
                        var: "APQP_TABLE",
                        message: e.to_string(),
                    }
                })?),
                None => None,
            },
            user: dropdown_value(std::env::var("APQP_USER").ok()),
            event_type: dropdown_value(std::env::var("APQP_EVENT_TYPE").ok()),
            date_bucket: match dropdown_value(std::env::var("APQP_DATE_BUCKET").ok()) {
                Some(value) => value.parse::<DateBucket>().map_err(|e| {
                    ConfigError::Invalid {
                        var: "APQP_DATE_BUCKET",
                        message: e.to_string(),
                    }
                })?,
                None => DateBucket::All,
            },
        };

        let export_path = std::env::var("APQP_EXPORT_PATH").ok().map(PathBuf::from);

        Ok(Self {
            api_url,
            page,
            page_size,
            filter,
            export_path,
        })
    }
}

/// Normalize a dropdown-style variable: unset, empty, and the `"all"`
/// sentinel all mean "no filtering".
fn dropdown_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != ALL_SENTINEL)
}

fn parse_var(var: &'static str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var,
            message: format!("expected a positive integer, got {value:?}"),
        }),
        Err(_) => Ok(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropdown_treats_all_and_empty_as_unset() {
        assert_eq!(dropdown_value(None), None);
        assert_eq!(dropdown_value(Some("".into())), None);
        assert_eq!(dropdown_value(Some("  ".into())), None);
        assert_eq!(dropdown_value(Some("all".into())), None);
        assert_eq!(dropdown_value(Some("phase".into())), Some("phase".into()));
    }
}
