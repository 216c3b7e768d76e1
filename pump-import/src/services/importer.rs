//! Incremental import
//!
//! One run reads the latest checkpoint, pages through the remote history
//! (newest first) until it reaches that checkpoint, the end of history or the
//! page limit. It keeps every listen strictly newer than the checkpoint and
//! commits those tracks together with a new checkpoint.
//!
//! Runs are not protected against each other: two importers writing to the
//! same store at once can both import the same listens.

use crate::error::ImportResult;
use crate::models::ListenRecord;
use crate::services::ListenSource;
use chrono::{DateTime, Utc};
use pump_common::config::{CommitMode, ImportConfig};
use pump_common::db::{ImportCheckpoint, ImportStore, NewCheckpoint, NewTrack};
use tracing::{info, warn};

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub pages_fetched: u32,
    pub records_seen: usize,
    pub imported: usize,
    /// Checkpoint written by this run, `None` when nothing was new
    pub checkpoint: Option<ImportCheckpoint>,
}

/// Listens newer than `watermark`, in the order given
///
/// Stops at the first record at or below the watermark: input is newest
/// first, so everything after it was imported by an earlier run.
pub fn select_new(records: &[ListenRecord], watermark: Option<DateTime<Utc>>) -> Vec<NewTrack> {
    records
        .iter()
        .take_while(|record| watermark.map_or(true, |w| record.listened_at > w))
        .map(ListenRecord::to_new_track)
        .collect()
}

/// Drives one import run against a source and a store
pub struct Importer<'a> {
    source: &'a dyn ListenSource,
    store: &'a dyn ImportStore,
    config: &'a ImportConfig,
}

impl<'a> Importer<'a> {
    pub fn new(
        source: &'a dyn ListenSource,
        store: &'a dyn ImportStore,
        config: &'a ImportConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Run a single import
    ///
    /// Any fetch error aborts before anything is written. Any write error
    /// leaves the checkpoint where it was.
    pub async fn run(&self) -> ImportResult<ImportOutcome> {
        let watermark = self
            .store
            .latest_checkpoint()
            .await?
            .map(|checkpoint| checkpoint.newest_listened_at);

        match watermark {
            Some(ts) => info!("Importing listens newer than {}", ts.to_rfc3339()),
            None => info!("No previous checkpoint, importing full history"),
        }

        let (records, pages_fetched) = self.fetch_pages(watermark).await?;
        let accepted = select_new(&records, watermark);

        let Some(checkpoint) = NewCheckpoint::for_tracks(&accepted) else {
            info!(
                "No new listens in {} records from {} pages",
                records.len(),
                pages_fetched
            );
            return Ok(ImportOutcome {
                pages_fetched,
                records_seen: records.len(),
                imported: 0,
                checkpoint: None,
            });
        };

        info!("Saving tracks... {}", accepted.len());
        let saved = self.commit(&accepted, &checkpoint).await?;
        info!(
            imported = accepted.len(),
            checkpoint_id = saved.id,
            newest = %saved.newest_listened_at.to_rfc3339(),
            "Tracks saved!"
        );

        Ok(ImportOutcome {
            pages_fetched,
            records_seen: records.len(),
            imported: accepted.len(),
            checkpoint: Some(saved),
        })
    }

    /// Collect pages newest first until the watermark, an empty page, the last
    /// remote page, or the page limit
    async fn fetch_pages(
        &self,
        watermark: Option<DateTime<Utc>>,
    ) -> ImportResult<(Vec<ListenRecord>, u32)> {
        let max_pages = self.config.max_pages;
        let mut records = Vec::new();
        let mut pages_fetched = 0;

        for page in 1..=max_pages {
            info!("Fetching page {}", page);
            let listen_page = self.source.fetch_page(page).await?;
            pages_fetched = page;

            if listen_page.records.is_empty() {
                info!("Page {} is empty, end of history", page);
                return Ok((records, pages_fetched));
            }

            let reached_watermark = watermark
                .is_some_and(|w| listen_page.records.iter().any(|r| r.listened_at <= w));
            let last_page = listen_page.total_pages.is_some_and(|total| page >= total);

            records.extend(listen_page.records);

            if reached_watermark {
                info!("Page {} reaches the last checkpoint", page);
                return Ok((records, pages_fetched));
            }
            if last_page {
                info!("Page {} is the last page of history", page);
                return Ok((records, pages_fetched));
            }
        }

        warn!(
            "Stopped at the {} page limit; listens older than page {} are not imported",
            max_pages, max_pages
        );
        Ok((records, pages_fetched))
    }

    async fn commit(
        &self,
        tracks: &[NewTrack],
        checkpoint: &NewCheckpoint,
    ) -> ImportResult<ImportCheckpoint> {
        match self.config.commit_mode {
            CommitMode::Atomic => Ok(self.store.commit_import(tracks, checkpoint).await?),
            CommitMode::TwoPhase => {
                self.store.create_tracks(tracks).await?;
                // Tracks are committed; a failure past this point re-imports them next run
                Ok(self.store.append_checkpoint(checkpoint).await?)
            }
        }
    }
}
