//! Networked PostgreSQL backend

use crate::config::{DatabaseConfig, DbBackend};
use crate::db::migrations::{pending_migrations, POSTGRES_SCHEMA_VERSION_TABLE};
use crate::db::models::{ImportCheckpoint, NewCheckpoint, NewTrack, Track};
use crate::db::store::{validate_commit, ImportStore};
use crate::time::now;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::{PgConnection, PgPool};
use std::str::FromStr;
use tracing::{debug, info};

/// PostgreSQL-backed store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect using host/user/password/database settings
    ///
    /// TLS is disabled. Empty user or password fall back to libpq defaults.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .database(&config.name)
            .ssl_mode(PgSslMode::Disable);
        if !config.user.is_empty() {
            options = options.username(&config.user);
        }
        if !config.password.is_empty() {
            options = options.password(&config.password);
        }

        let store = Self::connect_with(options).await?;
        info!(
            "Connected to PostgreSQL database {} on {}",
            config.name, config.host
        );
        Ok(store)
    }

    /// Connect using a `postgres://` URL
    pub async fn connect_url(url: &str) -> Result<Self> {
        let options = PgConnectOptions::from_str(url)?;
        Self::connect_with(options).await
    }

    async fn connect_with(options: PgConnectOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn insert_tracks(
    conn: &mut PgConnection,
    tracks: &[NewTrack],
    stamp: DateTime<Utc>,
) -> Result<u64> {
    let mut written = 0;
    for track in tracks {
        sqlx::query(
            r#"
            INSERT INTO tracks (created_at, updated_at, title, artist, album, listened_at)
            VALUES ($1, $2, $3, $4, $5, $6)
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
    conn: &mut PgConnection,
    checkpoint: &NewCheckpoint,
    stamp: DateTime<Utc>,
) -> Result<ImportCheckpoint> {
    let row = sqlx::query_as::<_, ImportCheckpoint>(
        r#"
        INSERT INTO import_checkpoints (created_at, updated_at, count, newest_listened_at)
        VALUES ($1, $2, $3, $4)
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
impl ImportStore for PostgresStore {
    fn backend(&self) -> DbBackend {
        DbBackend::Postgres
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(POSTGRES_SCHEMA_VERSION_TABLE)
            .execute(&self.pool)
            .await?;

        let current_version = self.schema_version().await?;

        for migration in pending_migrations(current_version) {
            info!("Running migration v{}: {}", migration.version, migration.description);

            let mut tx = self.pool.begin().await?;
            for statement in migration.postgres {
                sqlx::query(statement).execute(&mut *tx).await?;
            }
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(migration.version)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            info!("✓ Migration v{} completed", migration.version);
        }

        Ok(())
    }

    async fn schema_version(&self) -> Result<i64> {
        let table_exists: bool =
            sqlx::query_scalar("SELECT to_regclass('schema_version') IS NOT NULL")
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
