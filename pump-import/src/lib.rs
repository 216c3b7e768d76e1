//! pump-import library interface
//!
//! Incremental import of Last.fm listening history into the pump database.
//! Exposed as a library for integration testing.

pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ImportError, ImportResult};
pub use crate::models::{ListenPage, ListenRecord};
pub use crate::services::{ImportOutcome, Importer, LastFmClient, ListenSource};
