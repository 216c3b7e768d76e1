//! Storage backend abstraction
//!
//! The importer only talks to [`ImportStore`]. Track writes and checkpoint
//! writes are exposed both separately and as one transaction so the caller
//! can choose its commit boundary.

use crate::config::DbBackend;
use crate::db::models::{ImportCheckpoint, NewCheckpoint, NewTrack, Track};
use crate::{Error, Result};
use async_trait::async_trait;

#[async_trait]
pub trait ImportStore: Send + Sync {
    /// Engine behind this store
    fn backend(&self) -> DbBackend;

    /// Create or upgrade the schema. Safe to call repeatedly.
    async fn migrate(&self) -> Result<()>;

    /// Highest applied schema version, 0 for an empty database
    async fn schema_version(&self) -> Result<i64>;

    /// Most recently created, non-deleted checkpoint
    async fn latest_checkpoint(&self) -> Result<Option<ImportCheckpoint>>;

    /// Insert all `tracks` in one transaction; any failure rolls every insert back
    async fn create_tracks(&self, tracks: &[NewTrack]) -> Result<u64>;

    /// Append a checkpoint outside of any track transaction
    async fn append_checkpoint(&self, checkpoint: &NewCheckpoint) -> Result<ImportCheckpoint>;

    /// Insert `tracks` and `checkpoint` in one transaction
    async fn commit_import(
        &self,
        tracks: &[NewTrack],
        checkpoint: &NewCheckpoint,
    ) -> Result<ImportCheckpoint>;

    /// All non-deleted tracks, newest listen first
    async fn tracks(&self) -> Result<Vec<Track>>;

    /// Close the underlying connection pool
    async fn close(&self);
}

/// Reject a track/checkpoint pair that disagree on the number of tracks
pub(crate) fn validate_commit(tracks: &[NewTrack], checkpoint: &NewCheckpoint) -> Result<()> {
    if tracks.is_empty() {
        return Err(Error::InvalidInput(
            "refusing to write a checkpoint for an empty import".to_string(),
        ));
    }
    if checkpoint.count != tracks.len() as i64 {
        return Err(Error::InvalidInput(format!(
            "checkpoint count {} does not match {} tracks",
            checkpoint.count,
            tracks.len()
        )));
    }
    Ok(())
}
