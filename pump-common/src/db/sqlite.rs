//! Embedded SQLite backend

use crate::config::DbBackend;
use crate::db::migrations::{pending_migrations, SQLITE_SCHEMA_VERSION_TABLE};
use crate::db::models::{ImportCheckpoint, NewCheckpoint, NewTrack, Track};
use crate::db::store::{validate_commit, ImportStore};
use crate::time::now;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// SQLite-backed store, one database file
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file at `db_path`
    ///
    /// Does not migrate; see [`ImportStore::migrate`].
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(5000));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn insert_tracks(
    conn: &mut SqliteConnection,
    tracks: &[NewTrack],
    stamp: DateTime<Utc>,
) -> Result<u64> {
    let mut written = 0;
    for track in tracks {
        sqlx::query(
            r#"
            INSERT INTO tracks (created_at, updated_at, title, artist, album, listened_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(stamp)
        .bind(stamp)
        .bind(&track.title)
        .bind(&track.artist)
        .bind(&track.album)
        .bind(track.listened_at)
        .execute(&mut *conn)
        .await?;
        written += 1;
    }
    Ok(written)
}

async fn insert_checkpoint(
    conn: &mut SqliteConnection,
    checkpoint: &NewCheckpoint,
    stamp: DateTime<Utc>,
) -> Result<ImportCheckpoint> {
    let row = sqlx::query_as::<_, ImportCheckpoint>(
        r#"
        INSERT INTO import_checkpoints (created_at, updated_at, count, newest_listened_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, created_at, updated_at, deleted_at, count, newest_listened_at
        "#,
    )
    .bind(stamp)
    .bind(stamp)
    .bind(checkpoint.count)
    .bind(checkpoint.newest_listened_at)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

#[async_trait]
impl ImportStore for SqliteStore {
    fn backend(&self) -> DbBackend {
        DbBackend::Sqlite
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(SQLITE_SCHEMA_VERSION_TABLE)
            .execute(&self.pool)
            .await?;

        let current_version = self.schema_version().await?;

        for migration in pending_migrations(current_version) {
            info!("Running migration v{}: {}", migration.version, migration.description);

            let mut tx = self.pool.begin().await?;
            for statement in migration.sqlite {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(migration.version)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            info!("✓ Migration v{} completed", migration.version);
        }

        Ok(())
    }

    async fn schema_version(&self) -> Result<i64> {
        let table_exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name='schema_version'
            )
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await?;

        Ok(version.unwrap_or(0))
    }

    async fn latest_checkpoint(&self) -> Result<Option<ImportCheckpoint>> {
        let checkpoint = sqlx::query_as::<_, ImportCheckpoint>(
            r#"
            SELECT id, created_at, updated_at, deleted_at, count, newest_listened_at
            FROM import_checkpoints
            WHERE deleted_at IS NULL
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(checkpoint)
    }

    async fn create_tracks(&self, tracks: &[NewTrack]) -> Result<u64> {
        if tracks.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let written = insert_tracks(&mut tx, tracks, now()).await?;
        tx.commit().await?;

        debug!("Committed {} tracks", written);
        Ok(written)
    }

    async fn append_checkpoint(&self, checkpoint: &NewCheckpoint) -> Result<ImportCheckpoint> {
        let mut conn = self.pool.acquire().await?;
        insert_checkpoint(&mut conn, checkpoint, now()).await
    }

    async fn commit_import(
        &self,
        tracks: &[NewTrack],
        checkpoint: &NewCheckpoint,
    ) -> Result<ImportCheckpoint> {
        validate_commit(tracks, checkpoint)?;

        let stamp = now();
        let mut tx = self.pool.begin().await?;
        let written = insert_tracks(&mut tx, tracks, stamp).await?;
        let saved = insert_checkpoint(&mut tx, checkpoint, stamp).await?;
        tx.commit().await?;

        debug!(tracks = written, checkpoint_id = saved.id, "Committed import");
        Ok(saved)
    }

    async fn tracks(&self) -> Result<Vec<Track>> {
        let tracks = sqlx::query_as::<_, Track>(
            r#"
            SELECT id, created_at, updated_at, deleted_at, title, artist, album, listened_at
            FROM tracks
            WHERE deleted_at IS NULL
            ORDER BY listened_at DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tracks)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
