//! BRVM Ingest Binary
//!
//! Reads per-dataset JSON row dumps (written by the external scraper)
//! and upserts the normalized records into PostgreSQL.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p brvm-ingest -- /path/to/dumps
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`, `DB_NAME`
//!
//! ## Optional
//! - `DB_MAX_CONNECTIONS`: pool size (default: 5)
//! - `INGEST_BATCH_SIZE`: rows per upsert batch (default: 1000)
//! - `INGEST_MAX_ATTEMPTS`: attempts per batch (default: 3)
//! - `INGEST_INITIAL_BACKOFF_MS`: first retry delay (default: 500)
//! - `RUST_LOG`: log filter (default: info)

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use brvm_ingest::config::Settings;
use brvm_ingest::{IngestPipeline, JsonDumpSource, PgRecordStore, UpsertWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real deployments set the variables directly.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let dump_dir = std::env::args()
        .nth(1)
        .context("usage: brvm-ingest <dump-dir>")?;

    let settings = Settings::from_env()?;
    let store = PgRecordStore::connect(
        &settings.database.url(),
        settings.database.max_connections,
    )
    .await?;
    let writer = UpsertWriter::new(store)
        .with_batch_size(settings.batch_size)
        .with_retry_policy(settings.retry);
    let pipeline = IngestPipeline::new(JsonDumpSource::new(dump_dir), writer);

    let run_date = chrono::Local::now().date_naive();
    info!(run_date = %run_date, "starting ingest run");

    let outcomes = pipeline.run_all(run_date).await;
    let mut failures = 0usize;
    for (dataset, outcome) in &outcomes {
        match outcome {
            Ok(summary) => info!(
                dataset = %dataset,
                records = summary.records,
                written = summary.written,
                "dataset complete"
            ),
            Err(_) => failures += 1,
        }
    }

    if failures > 0 {
        bail!("{failures} of {} datasets failed", outcomes.len());
    }
    info!("ingest run complete");
    Ok(())
}
