//! `apqp-dashboard` -- terminal view over the APQP history pipeline.
//!
//! Fetches one page of nested project history from the backend, flattens
//! it, applies the configured filters, and renders a table. Optionally
//! writes the filtered set to a CSV file. One fetch is in flight at a
//! time and is awaited to completion; a fetch failure renders as an error
//! banner with zero records rather than aborting.

use apqp_client::HistoryClient;
use apqp_core::export::export_filename;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apqp_dashboard::config::DashboardConfig;
use apqp_dashboard::store::DashboardStore;
use apqp_dashboard::view;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "apqp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DashboardConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        api_url = %config.api_url,
        page = config.page,
        page_size = config.page_size,
        "Starting apqp-dashboard",
    );

    let client = HistoryClient::new(config.api_url.clone());
    let mut store = DashboardStore::with_initial_page(config.page, config.page_size);
    store.set_filter(config.filter.clone());

    let ticket = store.begin_fetch();
    let request = ticket.request();
    match client
        .fetch_history_page(request.page, request.page_size)
        .await
    {
        Ok(page) => {
            store.complete_fetch(ticket, &page);
        }
        Err(e) => {
            store.fail_fetch(ticket, e.to_string());
        }
    }

    let now = Utc::now();

    if let Some(error) = store.error() {
        println!("Error: {error}\n");
    }

    let visible = store.visible(now);
    println!("{}", view::render_table(&visible));
    println!();
    println!(
        "{}",
        view::render_summary(visible.len(), store.records().len(), store.page())
    );

    if let Some(path) = &config.export_path {
        let path = if path.is_dir() {
            path.join(export_filename(now.date_naive()))
        } else {
            path.clone()
        };

        let csv = store.export_csv(now);
        std::fs::write(&path, csv).unwrap_or_else(|e| {
            tracing::error!(error = %e, path = %path.display(), "Failed to write CSV export");
            std::process::exit(1);
        });
        tracing::info!(path = %path.display(), "Exported filtered history");
    }
}
