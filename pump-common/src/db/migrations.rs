//! Database schema migrations
//!
//! Versioned, append-only migrations with SQL for each supported dialect.
//! Applied versions are tracked in the `schema_version` table, so running the
//! migrator again is a no-op.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field already ran them
//! 2. **Always add new migrations** - append to [`MIGRATIONS`] with the next version
//! 3. **Keep statements idempotent** - `IF NOT EXISTS` everywhere
//! 4. **Write both dialects** - every migration ships SQLite and PostgreSQL SQL

use tracing::{info, warn};

/// One schema change, expressed per dialect
#[derive(Debug)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sqlite: &'static [&'static str],
    pub postgres: &'static [&'static str],
}

/// All migrations in application order
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Create tracks table",
        sqlite: &[r#"
            CREATE TABLE IF NOT EXISTS tracks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                deleted_at TIMESTAMP,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                album TEXT NOT NULL,
                listened_at TIMESTAMP NOT NULL
            )
            "#],
        postgres: &[r#"
            CREATE TABLE IF NOT EXISTS tracks (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                deleted_at TIMESTAMPTZ,
                title TEXT NOT NULL,
                artist TEXT NOT NULL,
                album TEXT NOT NULL,
                listened_at TIMESTAMPTZ NOT NULL
            )
            "#],
    },
    Migration {
        version: 2,
        description: "Create import_checkpoints table",
        sqlite: &[r#"
            CREATE TABLE IF NOT EXISTS import_checkpoints (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL,
                deleted_at TIMESTAMP,
                count INTEGER NOT NULL,
                newest_listened_at TIMESTAMP NOT NULL
            )
            "#],
        postgres: &[r#"
            CREATE TABLE IF NOT EXISTS import_checkpoints (
                id BIGSERIAL PRIMARY KEY,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                deleted_at TIMESTAMPTZ,
                count BIGINT NOT NULL,
                newest_listened_at TIMESTAMPTZ NOT NULL
            )
            "#],
    },
    Migration {
        version: 3,
        description: "Index tracks by listened_at",
        sqlite: &["CREATE INDEX IF NOT EXISTS idx_tracks_listened_at ON tracks (listened_at)"],
        postgres: &["CREATE INDEX IF NOT EXISTS idx_tracks_listened_at ON tracks (listened_at)"],
    },
];

/// Current schema version (highest version in [`MIGRATIONS`])
pub const CURRENT_SCHEMA_VERSION: i64 = 3;

pub(crate) const SQLITE_SCHEMA_VERSION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    )
    "#;

pub(crate) const POSTGRES_SCHEMA_VERSION_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY,
        applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#;

/// Migrations still to run for a database at `current_version`
///
/// Logs the decision the same way for every backend.
pub fn pending_migrations(current_version: i64) -> Vec<&'static Migration> {
    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Vec::new();
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Vec::new();
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    MIGRATIONS
        .iter()
        .filter(|m| m.version > current_version)
        .collect()
}
