//! Configuration loading from the process environment
//!
//! The importer reads its configuration once at startup and hands the
//! resulting [`ImportConfig`] to every component by reference.

use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Default Last.fm API endpoint
pub const DEFAULT_LASTFM_API_URL: &str = "http://ws.audioscrobbler.com/2.0/";
/// Records requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Pages scanned per run before giving up on reaching the watermark
pub const DEFAULT_MAX_PAGES: u32 = 50;

const DEFAULT_DB_HOST: &str = "localhost";
const DEFAULT_DB_NAME: &str = "pump";
const DEFAULT_SQLITE_FILE: &str = "pump.db";

/// Persistence engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbBackend {
    /// Networked PostgreSQL server
    Postgres,
    /// Embedded file-based SQLite database
    Sqlite,
}

impl FromStr for DbBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DbBackend::Postgres),
            "sqlite" | "sqlite3" => Ok(DbBackend::Sqlite),
            other => Err(Error::Config(format!("Unknown database backend: {}", other))),
        }
    }
}

impl fmt::Display for DbBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbBackend::Postgres => write!(f, "postgres"),
            DbBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// How tracks and the new checkpoint reach the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// Tracks and checkpoint in a single transaction
    Atomic,
    /// Tracks in one transaction, checkpoint appended afterwards.
    /// A crash between the two phases re-imports those tracks next run.
    TwoPhase,
}

impl FromStr for CommitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" => Ok(CommitMode::Atomic),
            "two-phase" | "two_phase" | "twophase" => Ok(CommitMode::TwoPhase),
            other => Err(Error::Config(format!("Unknown commit mode: {}", other))),
        }
    }
}

/// What to do with a remote record whose timestamp cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Drop the record and log a warning
    Skip,
    /// Keep the record, stamped at the Unix epoch
    Epoch,
}

impl FromStr for TimestampPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "reject" => Ok(TimestampPolicy::Skip),
            "epoch" => Ok(TimestampPolicy::Epoch),
            other => Err(Error::Config(format!("Unknown timestamp policy: {}", other))),
        }
    }
}

/// Database connection settings
#[derive(Clone)]
pub struct DatabaseConfig {
    pub backend: DbBackend,
    pub host: String,
    pub user: String,
    pub password: String,
    /// Database name (PostgreSQL) or database file path (SQLite)
    pub name: String,
}

impl DatabaseConfig {
    /// SQLite database file, only meaningful for [`DbBackend::Sqlite`]
    pub fn sqlite_path(&self) -> PathBuf {
        PathBuf::from(&self.name)
    }

    /// Settings for a SQLite file at `path`
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: DbBackend::Sqlite,
            host: String::new(),
            user: String::new(),
            password: String::new(),
            name: path.into().to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("name", &self.name)
            .finish()
    }
}

/// Last.fm endpoint settings
#[derive(Clone)]
pub struct LastFmConfig {
    pub api_url: String,
    pub api_key: String,
    pub user: String,
    pub page_size: u32,
}

impl fmt::Debug for LastFmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LastFmConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("user", &self.user)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Complete importer configuration
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub database: DatabaseConfig,
    pub lastfm: LastFmConfig,
    pub max_pages: u32,
    pub commit_mode: CommitMode,
    pub timestamp_policy: TimestampPolicy,
}

impl ImportConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = match get("PUMP_DB_BACKEND") {
            Some(value) => value.parse()?,
            None => DbBackend::Postgres,
        };

        let default_name = match backend {
            DbBackend::Postgres => DEFAULT_DB_NAME,
            DbBackend::Sqlite => DEFAULT_SQLITE_FILE,
        };

        let database = DatabaseConfig {
            backend,
            host: get("PUMP_DB_HOST").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            user: get("PUMP_DB_USER").unwrap_or_default(),
            password: get("PUMP_DB_PASSWORD").unwrap_or_default(),
            name: get("PUMP_DB_NAME").unwrap_or_else(|| default_name.to_string()),
        };

        let lastfm = LastFmConfig {
            api_url: get("LASTFM_API_URL").unwrap_or_else(|| DEFAULT_LASTFM_API_URL.to_string()),
            api_key: get("LASTFM_API_KEY")
                .ok_or_else(|| Error::Config("LASTFM_API_KEY is not set".to_string()))?,
            user: get("LASTFM_USER")
                .ok_or_else(|| Error::Config("LASTFM_USER is not set".to_string()))?,
            page_size: parse_positive("PUMP_PAGE_SIZE", get("PUMP_PAGE_SIZE"), DEFAULT_PAGE_SIZE)?,
        };

        let max_pages = parse_positive("PUMP_MAX_PAGES", get("PUMP_MAX_PAGES"), DEFAULT_MAX_PAGES)?;

        let commit_mode = match get("PUMP_COMMIT_MODE") {
            Some(value) => value.parse()?,
            None => CommitMode::Atomic,
        };

        let timestamp_policy = match get("PUMP_TIMESTAMP_POLICY") {
            Some(value) => value.parse()?,
            None => TimestampPolicy::Skip,
        };

        Ok(Self {
            database,
            lastfm,
            max_pages,
            commit_mode,
            timestamp_policy,
        })
    }
}

fn parse_positive(key: &str, value: Option<String>, default: u32) -> Result<u32> {
    let Some(value) = value else {
        return Ok(default);
    };

    match value.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Config(format!(
            "{} must be a positive integer, got {:?}",
            key, value
        ))),
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "***"
    }
}
