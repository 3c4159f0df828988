//! `apqp-client` -- typed reqwest client for the APQP backend's history
//! endpoints.
//!
//! The backend owns authentication, persistence, and the endpoints
//! themselves; this crate only speaks their request/response contract and
//! hands validated pages to `apqp-core` for flattening.

pub mod api;
pub mod models;

pub use api::{ClientError, HistoryClient};
pub use models::{HistoryPage, ProjectHistory};
