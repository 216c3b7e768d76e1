//! Last.fm API client
//!
//! Pages through `user.getrecenttracks`, newest listen first, and normalizes
//! each entry into a [`ListenRecord`]. One request per page, no retries.

use crate::models::{ListenPage, ListenRecord};
use crate::services::ListenSource;
use async_trait::async_trait;
use pump_common::config::{LastFmConfig, TimestampPolicy};
use pump_common::time::{epoch, parse_unix_seconds};
use serde::Deserialize;
use thiserror::Error;

const USER_AGENT: &str = concat!("pump/", env!("CARGO_PKG_VERSION"));

/// Last.fm client errors
#[derive(Debug, Error)]
pub enum LastFmError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Last.fm error {code}: {message}")]
    RemoteError { code: i64, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Error body Last.fm sends instead of a result
#[derive(Debug, Deserialize)]
struct LfmErrorBody {
    error: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct LfmRecentTracksEnvelope {
    recenttracks: LfmRecentTracks,
}

#[derive(Debug, Deserialize)]
struct LfmRecentTracks {
    /// An array, or a bare object when the page holds a single entry
    #[serde(default)]
    track: OneOrMany<LfmTrack>,
    #[serde(rename = "@attr")]
    attr: Option<LfmPageAttr>,
}

#[derive(Debug, Deserialize)]
struct LfmPageAttr {
    #[serde(rename = "totalPages")]
    total_pages: Option<LfmScalar>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Last.fm encodes numbers as strings, but not everywhere
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LfmScalar {
    Text(String),
    Number(i64),
}

impl LfmScalar {
    fn into_text(self) -> String {
        match self {
            LfmScalar::Text(text) => text,
            LfmScalar::Number(n) => n.to_string(),
        }
    }
}

/// `{"#text": "..."}` wrapper used for artist and album
#[derive(Debug, Default, Deserialize)]
struct LfmText {
    #[serde(rename = "#text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct LfmDate {
    uts: Option<LfmScalar>,
}

#[derive(Debug, Default, Deserialize)]
struct LfmTrackAttr {
    nowplaying: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LfmTrack {
    #[serde(default)]
    name: String,
    #[serde(default)]
    artist: LfmText,
    #[serde(default)]
    album: LfmText,
    date: Option<LfmDate>,
    #[serde(rename = "@attr")]
    attr: Option<LfmTrackAttr>,
}

impl LfmTrack {
    fn is_now_playing(&self) -> bool {
        self.attr
            .as_ref()
            .and_then(|a| a.nowplaying.as_deref())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    fn normalize(self, policy: TimestampPolicy) -> Option<ListenRecord> {
        if self.is_now_playing() {
            tracing::debug!(title = %self.name, "Skipping now-playing entry");
            return None;
        }

        let uts = self.date.and_then(|d| d.uts).map(LfmScalar::into_text);
        let listened_at = match uts.as_deref().and_then(parse_unix_seconds) {
            Some(ts) => ts,
            None => match policy {
                TimestampPolicy::Skip => {
                    tracing::warn!(
                        title = %self.name,
                        artist = %self.artist.text,
                        uts = ?uts,
                        "Dropping listen with unparsable timestamp"
                    );
                    return None;
                }
                TimestampPolicy::Epoch => {
                    tracing::warn!(
                        title = %self.name,
                        artist = %self.artist.text,
                        uts = ?uts,
                        "Unparsable timestamp, recording listen at Unix epoch"
                    );
                    epoch()
                }
            },
        };

        Some(ListenRecord {
            title: self.name,
            artist: self.artist.text,
            album: self.album.text,
            listened_at,
        })
    }
}

/// Decode a `user.getrecenttracks` response body
pub fn parse_recent_tracks(body: &str, policy: TimestampPolicy) -> Result<ListenPage, LastFmError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| LastFmError::ParseError(e.to_string()))?;

    if value.get("error").is_some() {
        let error: LfmErrorBody =
            serde_json::from_value(value).map_err(|e| LastFmError::ParseError(e.to_string()))?;
        return Err(LastFmError::RemoteError {
            code: error.error,
            message: error.message,
        });
    }

    let envelope: LfmRecentTracksEnvelope =
        serde_json::from_value(value).map_err(|e| LastFmError::ParseError(e.to_string()))?;

    let total_pages = envelope
        .recenttracks
        .attr
        .and_then(|a| a.total_pages)
        .and_then(|t| t.into_text().trim().parse::<u32>().ok());

    let records = envelope
        .recenttracks
        .track
        .into_vec()
        .into_iter()
        .filter_map(|track| track.normalize(policy))
        .collect();

    Ok(ListenPage {
        records,
        total_pages,
    })
}

/// Last.fm API client
pub struct LastFmClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    user: String,
    page_size: u32,
    timestamp_policy: TimestampPolicy,
}

impl LastFmClient {
    pub fn new(config: &LastFmConfig, timestamp_policy: TimestampPolicy) -> Result<Self, LastFmError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LastFmError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            user: config.user.clone(),
            page_size: config.page_size,
            timestamp_policy,
        })
    }

    fn page_query(&self, page: u32) -> [(&'static str, String); 6] {
        [
            ("method", "user.getrecenttracks".to_string()),
            ("user", self.user.clone()),
            ("api_key", self.api_key.clone()),
            ("format", "json".to_string()),
            ("limit", self.page_size.to_string()),
            ("page", page.to_string()),
        ]
    }

    /// Fetch one page of recent tracks (pages start at 1)
    pub async fn fetch_page(&self, page: u32) -> Result<ListenPage, LastFmError> {
        tracing::debug!(
            url = %self.api_url,
            user = %self.user,
            page,
            limit = self.page_size,
            "Querying Last.fm API"
        );

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&self.page_query(page))
            .send()
            .await
            .map_err(|e| LastFmError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LastFmError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            // Last.fm usually explains itself in the body
            return match parse_recent_tracks(&body, self.timestamp_policy) {
                Err(remote @ LastFmError::RemoteError { .. }) => Err(remote),
                _ => Err(LastFmError::ApiError(status.as_u16(), body)),
            };
        }

        let page_data = parse_recent_tracks(&body, self.timestamp_policy)?;

        tracing::debug!(
            page,
            records = page_data.records.len(),
            total_pages = ?page_data.total_pages,
            "Retrieved recent tracks from Last.fm"
        );

        Ok(page_data)
    }
}

#[async_trait]
impl ListenSource for LastFmClient {
    async fn fetch_page(&self, page: u32) -> Result<ListenPage, LastFmError> {
        LastFmClient::fetch_page(self, page).await
    }
}
