//! Service modules for listening-history import
//!
//! - `lastfm_client`: remote pager over Last.fm recent tracks
//! - `importer`: incremental import driven by the stored checkpoint

pub mod importer;
pub mod lastfm_client;

pub use importer::{select_new, ImportOutcome, Importer};
pub use lastfm_client::{parse_recent_tracks, LastFmClient, LastFmError};

use crate::models::ListenPage;
use async_trait::async_trait;

/// Source of listen records, one page at a time, newest listen first
#[async_trait]
pub trait ListenSource: Send + Sync {
    /// Fetch page `page` (1-based)
    ///
    /// # Returns
    /// * `Ok(ListenPage)` - records on the page, plus the remote page count when known
    /// * `Err(_)` - transport or decode failure; fatal to the import run
    async fn fetch_page(&self, page: u32) -> Result<ListenPage, LastFmError>;
}
