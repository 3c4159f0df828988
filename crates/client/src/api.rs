//! REST client for the history endpoints of the APQP backend.
//!
//! Wraps the paginated nested-history endpoint and the single-table
//! per-project variant using [`reqwest`]. There are no retries and no
//! timeout beyond the HTTP client defaults; a failed fetch surfaces as a
//! single error for the caller to display.

use apqp_core::history::{EntityKind, RawRecord};

use crate::models::{HistoryPage, RawHistoryPage};

/// Message used when an error response body carries nothing usable.
const DEFAULT_ERROR_MESSAGE: &str = "Request failed";

/// HTTP client for one backend instance.
pub struct HistoryClient {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the history REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("History API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// The response decoded but violated the structural contract.
    #[error("Malformed history response: {0}")]
    Contract(String),
}

impl HistoryClient {
    /// Create a client for a backend instance.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:8000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client reusing an existing [`reqwest::Client`] (useful for
    /// connection pooling across services).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Fetch one page of nested project histories.
    ///
    /// Sends `GET {base}/history/?page={page}&page_size={page_size}` and
    /// validates the structural contract before handing the page back.
    pub async fn fetch_history_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<HistoryPage, ClientError> {
        tracing::debug!(page, page_size, "Fetching history page");

        let response = self
            .client
            .get(format!("{}/history/", self.base_url))
            .query(&[("page", page), ("page_size", page_size)])
            .send()
            .await?;

        let raw: RawHistoryPage = Self::parse_response(response).await?;
        let page = HistoryPage::try_from(raw)?;

        tracing::debug!(
            projects = page.results.len(),
            total = page.total,
            pages = page.pages,
            "History page received",
        );
        Ok(page)
    }

    /// Fetch the flat history list for a single table of a single project.
    ///
    /// Sends `GET {base}/history/{table}/?project_id={project_id}`.
    pub async fn fetch_table_history(
        &self,
        table: EntityKind,
        project_id: &str,
    ) -> Result<Vec<RawRecord>, ClientError> {
        tracing::debug!(table = %table, project_id, "Fetching single-table history");

        let response = self
            .client
            .get(format!("{}/history/{}/", self.base_url, table))
            .query(&[("project_id", project_id)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status. On failure, extracts a
    /// display message from the error body.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }
        Ok(response)
    }

    /// Decode a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Pull a human-readable message out of an error response body.
///
/// The backend wraps errors as `{"error": ...}`; proxies in front of it
/// have been seen using `{"detail": ...}` and `{"message": ...}`. Falls
/// back to the raw body, then to a fixed default for empty bodies.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_the_error_key() {
        let body = r#"{"error": "Project not found", "code": "NOT_FOUND"}"#;
        assert_eq!(extract_error_message(body), "Project not found");
    }

    #[test]
    fn error_message_falls_back_to_detail_and_message_keys() {
        assert_eq!(
            extract_error_message(r#"{"detail": "Not authenticated"}"#),
            "Not authenticated"
        );
        assert_eq!(
            extract_error_message(r#"{"message": "Gateway timeout"}"#),
            "Gateway timeout"
        );
    }

    #[test]
    fn error_message_falls_back_to_the_raw_body() {
        assert_eq!(extract_error_message("502 Bad Gateway\n"), "502 Bad Gateway");
    }

    #[test]
    fn empty_error_body_uses_the_default_message() {
        assert_eq!(extract_error_message(""), DEFAULT_ERROR_MESSAGE);
        assert_eq!(extract_error_message("   "), DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn base_url_trailing_slashes_are_trimmed() {
        let client = HistoryClient::new("http://localhost:8000/api///");
        assert_eq!(client.base_url, "http://localhost:8000/api");
    }
}
