//! Error types for the snapshot log reader.
//!
//! Malformed lines are never errors; they are skipped and counted by the
//! iterator. The only failure surfaced to callers is a log file that
//! exists but cannot be opened.

use std::path::PathBuf;

/// Errors that can occur when opening a snapshot log.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file exists but could not be opened.
    #[error("failed to open snapshot log {}: {source}", path.display())]
    Open {
        /// Path of the log file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
