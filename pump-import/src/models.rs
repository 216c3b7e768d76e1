//! Remote listen data as seen by the importer

use chrono::{DateTime, Utc};
use pump_common::db::NewTrack;

/// One completed listen reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub listened_at: DateTime<Utc>,
}

impl ListenRecord {
    /// Track row to persist for this listen
    pub fn to_new_track(&self) -> NewTrack {
        NewTrack {
            title: self.title.clone(),
            artist: self.artist.clone(),
            album: self.album.clone(),
            listened_at: self.listened_at,
        }
    }
}

/// One page of remote listens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenPage {
    pub records: Vec<ListenRecord>,
    /// Total pages reported by the remote side, if any
    pub total_pages: Option<u32>,
}
