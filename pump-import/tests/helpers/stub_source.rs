//! In-memory ListenSource

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pump_import::services::LastFmError;
use pump_import::{ListenPage, ListenRecord, ListenSource};
use std::sync::Mutex;

pub fn ts(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(seconds, 0).unwrap()
}

/// Listen named `track-{seconds}`
pub fn listen(seconds: i64) -> ListenRecord {
    ListenRecord {
        title: format!("track-{}", seconds),
        artist: "Artist".to_string(),
        album: "Album".to_string(),
        listened_at: ts(seconds),
    }
}

/// Serves fixed pages, newest first, and records which pages were asked for
pub struct StubSource {
    pages: Vec<Vec<ListenRecord>>,
    report_total: bool,
    fail_on_page: Option<u32>,
    requested: Mutex<Vec<u32>>,
}

impl StubSource {
    /// Pages of listens given as epoch seconds, remote page count reported
    pub fn new(pages: &[&[i64]]) -> Self {
        Self::from_records(
            pages
                .iter()
                .map(|page| page.iter().map(|s| listen(*s)).collect())
                .collect(),
        )
    }

    /// Pages of already-built listens, remote page count reported
    pub fn from_records(pages: Vec<Vec<ListenRecord>>) -> Self {
        Self {
            pages,
            report_total: true,
            fail_on_page: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Same pages split into chunks of `page_size`
    pub fn paged(stamps: &[i64], page_size: usize) -> Self {
        let chunks: Vec<&[i64]> = stamps.chunks(page_size).collect();
        Self::new(&chunks)
    }

    /// Do not report a total page count
    pub fn without_total(mut self) -> Self {
        self.report_total = false;
        self
    }

    /// Fail with a network error when `page` is requested
    pub fn failing_on(mut self, page: u32) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListenSource for StubSource {
    async fn fetch_page(&self, page: u32) -> Result<ListenPage, LastFmError> {
        self.requested.lock().unwrap().push(page);

        if self.fail_on_page == Some(page) {
            return Err(LastFmError::NetworkError("connection reset".to_string()));
        }

        let records = self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default();
        let total_pages = self.report_total.then_some(self.pages.len() as u32);

        Ok(ListenPage {
            records,
            total_pages,
        })
    }
}
