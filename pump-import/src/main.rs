//! pump-import - Last.fm listening history importer
//!
//! Batch job: reads configuration from the environment, brings the database
//! schema up to date, imports every listen newer than the last checkpoint,
//! and exits. Any error ends the process with a non-zero status.

use anyhow::{Context, Result};
use pump_common::ImportConfig;
use pump_import::{Importer, LastFmClient};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting pump-import");
    info!(
        "Version: {} ({}, {} build, built {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TIMESTAMP")
    );

    let config = ImportConfig::from_env().context("Failed to load configuration")?;
    info!(
        backend = %config.database.backend,
        user = %config.lastfm.user,
        max_pages = config.max_pages,
        page_size = config.lastfm.page_size,
        commit_mode = ?config.commit_mode,
        timestamp_policy = ?config.timestamp_policy,
        "Configuration loaded"
    );

    let store = pump_common::db::open_store(&config.database)
        .await
        .context("Failed to open database")?;

    let client = LastFmClient::new(&config.lastfm, config.timestamp_policy)
        .context("Failed to create Last.fm client")?;

    let result = Importer::new(&client, store.as_ref(), &config).run().await;
    store.close().await;
    let outcome = result.context("Import failed")?;

    info!(
        pages = outcome.pages_fetched,
        seen = outcome.records_seen,
        imported = outcome.imported,
        "Import complete"
    );

    Ok(())
}
