//! Test Helper Utilities
//!
//! Shared utilities for testing pump-import

#![allow(dead_code)]

pub mod db_utils;
pub mod log_capture;
pub mod stub_source;

// Re-export commonly used items
pub use db_utils::{create_test_store, reject_checkpoints, reject_track_titled, test_config};
pub use log_capture::{capture_logs, LogCapture};
pub use stub_source::{listen, ts, StubSource};
