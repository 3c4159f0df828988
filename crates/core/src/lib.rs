//! `apqp-core` -- domain model and pure transformation pipeline for the
//! APQP/PPAP history dashboard.
//!
//! This crate is synchronous and free of I/O so it can be used by the
//! client, the dashboard store, and any future CLI or worker tooling:
//! the nested payload model, the flattener, the filter engine, the CSV
//! exporter, and the pagination state all live here. Network access is
//! in `apqp-client`; state orchestration is in `apqp-dashboard`.

pub mod error;
pub mod export;
pub mod filter;
pub mod flatten;
pub mod history;
pub mod pagination;
pub mod types;
