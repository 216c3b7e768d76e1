//! Database models

use chrono::{DateTime, Utc};

/// A persisted listen. Rows are never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Track {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub listened_at: DateTime<Utc>,
}

/// Track fields supplied by the importer; id and audit columns are assigned on insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrack {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub listened_at: DateTime<Utc>,
}

/// Watermark left behind by a successful import run
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ImportCheckpoint {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    /// Tracks imported by the run that wrote this checkpoint
    pub count: i64,
    /// `listened_at` of the newest track imported by that run
    pub newest_listened_at: DateTime<Utc>,
}

/// Checkpoint fields supplied by the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCheckpoint {
    pub count: i64,
    pub newest_listened_at: DateTime<Utc>,
}

impl NewCheckpoint {
    /// Checkpoint describing `tracks`, or `None` when there is nothing to describe
    pub fn for_tracks(tracks: &[NewTrack]) -> Option<Self> {
        let newest_listened_at = tracks.iter().map(|t| t.listened_at).max()?;
        Some(Self {
            count: tracks.len() as i64,
            newest_listened_at,
        })
    }
}
