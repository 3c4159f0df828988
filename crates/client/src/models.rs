//! Wire types for the paginated history endpoint.

use std::collections::BTreeMap;

use serde::Deserialize;

use apqp_core::flatten::flatten_page;
use apqp_core::history::{HistoryRecord, NestedHistory};

use crate::api::ClientError;

/// One project's entry in a paginated history response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectHistory {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub history: NestedHistory,
}

/// Raw response shape, before the structural contract check.
///
/// `results` stays optional here so a missing object surfaces as a
/// [`ClientError::Contract`] instead of a generic decode failure.
#[derive(Debug, Deserialize)]
pub(crate) struct RawHistoryPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub pages: u32,
    pub results: Option<BTreeMap<String, ProjectHistory>>,
}

/// One validated page of nested project histories.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub pages: u32,
    /// Nested history per project id.
    pub results: BTreeMap<String, ProjectHistory>,
}

impl TryFrom<RawHistoryPage> for HistoryPage {
    type Error = ClientError;

    fn try_from(raw: RawHistoryPage) -> Result<Self, Self::Error> {
        let results = raw
            .results
            .ok_or_else(|| ClientError::Contract("response has no `results` object".into()))?;

        Ok(Self {
            total: raw.total,
            page: raw.page,
            page_size: raw.page_size,
            pages: raw.pages,
            results,
        })
    }
}

impl HistoryPage {
    /// Flatten every project on this page into one record list, newest
    /// first.
    pub fn flatten(&self) -> Vec<HistoryRecord> {
        flatten_page(
            self.results
                .values()
                .map(|project| (project.project_name.as_str(), &project.history)),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn missing_results_is_a_contract_violation() {
        let raw: RawHistoryPage = serde_json::from_value(serde_json::json!({
            "total": 12,
            "page": 1,
            "page_size": 20,
            "pages": 1,
        }))
        .unwrap();

        let err = HistoryPage::try_from(raw).unwrap_err();
        assert_matches!(err, ClientError::Contract(_));
    }

    #[test]
    fn empty_results_object_is_valid() {
        let raw: RawHistoryPage = serde_json::from_value(serde_json::json!({
            "total": 0,
            "page": 1,
            "page_size": 20,
            "pages": 0,
            "results": {},
        }))
        .unwrap();

        let page = HistoryPage::try_from(raw).unwrap();
        assert!(page.results.is_empty());
        assert!(page.flatten().is_empty());
    }

    #[test]
    fn page_parses_and_flattens_across_projects() {
        let raw: RawHistoryPage = serde_json::from_value(serde_json::json!({
            "total": 2,
            "page": 1,
            "page_size": 20,
            "pages": 1,
            "results": {
                "101": {
                    "project_name": "Gearbox",
                    "history": {
                        "project": [
                            {"id": "g1", "event": "created", "created_at": "2023-02-01T00:00:00Z"}
                        ]
                    }
                },
                "102": {
                    "project_name": "Housing",
                    "history": {
                        "project": [
                            {"id": "h1", "event": "created", "created_at": "2023-03-01T00:00:00Z"}
                        ]
                    }
                }
            }
        }))
        .unwrap();

        let page = HistoryPage::try_from(raw).unwrap();
        let records = page.flatten();

        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["h1", "g1"]);
        assert_eq!(records[0].title, "Housing");
        assert_eq!(records[1].title, "Gearbox");
    }
}
