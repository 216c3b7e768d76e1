//! Database initialization
//!
//! Selects the storage backend from configuration, connects, and brings the
//! schema up to date before anything reads or writes.

use crate::config::{DatabaseConfig, DbBackend};
use crate::db::postgres::PostgresStore;
use crate::db::sqlite::SqliteStore;
use crate::db::store::ImportStore;
use crate::Result;
use tracing::info;

/// Open the configured backend and run pending migrations
pub async fn open_store(config: &DatabaseConfig) -> Result<Box<dyn ImportStore>> {
    let store: Box<dyn ImportStore> = match config.backend {
        DbBackend::Postgres => Box::new(PostgresStore::connect(config).await?),
        DbBackend::Sqlite => Box::new(SqliteStore::open(&config.sqlite_path()).await?),
    };

    // Idempotent - safe to call on every startup
    store.migrate().await?;

    let schema_version = store.schema_version().await?;
    info!(
        backend = %store.backend(),
        schema_version,
        "Database ready"
    );

    Ok(store)
}
