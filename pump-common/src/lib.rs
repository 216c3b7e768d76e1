//! # Pump Common Library
//!
//! Shared code for the pump listening-history importer:
//! - Environment configuration
//! - Persistence models and schema migrations
//! - Storage backends (PostgreSQL, SQLite) behind one trait
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use config::ImportConfig;
pub use error::{Error, Result};
