//! Database Test Utilities
//!
//! Throwaway SQLite stores and failure injection via triggers

use pump_common::config::{
    CommitMode, DatabaseConfig, ImportConfig, LastFmConfig, TimestampPolicy,
};
use pump_common::db::{ImportStore, SqliteStore};
use tempfile::TempDir;

/// Create temporary test store with migrations applied
///
/// Returns (TempDir, SqliteStore) - TempDir must be kept alive for duration of test
pub async fn create_test_store() -> (TempDir, SqliteStore) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(&temp_dir.path().join("pump_test.db"))
        .await
        .expect("Failed to open test database");
    store.migrate().await.expect("Failed to migrate test database");
    (temp_dir, store)
}

/// Importer configuration pointing at a SQLite file and a fake endpoint
pub fn test_config(max_pages: u32, commit_mode: CommitMode) -> ImportConfig {
    ImportConfig {
        database: DatabaseConfig::sqlite("unused.db"),
        lastfm: LastFmConfig {
            api_url: "http://127.0.0.1:1/2.0/".to_string(),
            api_key: "test-key".to_string(),
            user: "listener".to_string(),
            page_size: 10,
        },
        max_pages,
        commit_mode,
        timestamp_policy: TimestampPolicy::Skip,
    }
}

/// Make any insert of a track with `title` fail
pub async fn reject_track_titled(store: &SqliteStore, title: &str) {
    let sql = format!(
        r#"
        CREATE TRIGGER reject_track BEFORE INSERT ON tracks
        WHEN NEW.title = '{}'
        BEGIN
            SELECT RAISE(ABORT, 'rejected track');
        END
        "#,
        title.replace('\'', "''")
    );
    sqlx::query(&sql)
        .execute(store.pool())
        .await
        .expect("Failed to create track trigger");
}

/// Make every checkpoint insert fail
pub async fn reject_checkpoints(store: &SqliteStore) {
    sqlx::query(
        r#"
        CREATE TRIGGER reject_checkpoint BEFORE INSERT ON import_checkpoints
        BEGIN
            SELECT RAISE(ABORT, 'rejected checkpoint');
        END
        "#,
    )
    .execute(store.pool())
    .await
    .expect("Failed to create checkpoint trigger");
}
