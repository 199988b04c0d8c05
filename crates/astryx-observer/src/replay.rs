//! Startup replay of the durable snapshot log into history.
//!
//! The agent's JSONL log is the durable record; the in-memory history
//! does not survive a restart. On startup the gateway reads the log line
//! by line and appends every decodable snapshot, so `/summary` and
//! `/api/history` reflect the agent's past steps immediately.
//!
//! Reading is blocking file I/O, so [`load_history`] runs it on the
//! blocking thread pool. It happens once, before the server accepts
//! requests, never on the ingestion path.
//!
//! # Usage
//!
//! ```rust,ignore
//! use astryx_observer::replay::load_history;
//!
//! let (history, outcome) = load_history("astrx_log.jsonl".into(), None).await?;
//! ```

use std::num::NonZeroUsize;
use std::path::PathBuf;

use astryx_log::{LogError, SnapshotLog};
use tracing::info;

use crate::history::HistoryStore;

/// Counts from one replay pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Snapshots appended to history.
    pub replayed: u64,
    /// Malformed lines skipped.
    pub skipped: u64,
}

/// Errors that can occur during startup replay.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// The log file exists but could not be opened.
    #[error("log error: {0}")]
    Log(#[from] LogError),

    /// The blocking replay task panicked or was cancelled.
    #[error("replay task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Append every decodable snapshot in `log` to `history`, in file order.
///
/// # Errors
///
/// Returns [`LogError::Open`] if the log exists but cannot be opened. A
/// missing log replays nothing.
pub fn replay_log(log: &SnapshotLog, history: &mut HistoryStore) -> Result<ReplayOutcome, LogError> {
    let mut lines = log.iter()?;
    let replayed = history.extend(lines.by_ref());
    Ok(ReplayOutcome {
        replayed,
        skipped: lines.skipped(),
    })
}

/// Build a history with the given retention and replay the log at `path`
/// into it, on the blocking thread pool.
///
/// # Errors
///
/// Returns [`ReplayError::Log`] if the log cannot be opened, or
/// [`ReplayError::Task`] if the blocking task fails.
pub async fn load_history(
    path: PathBuf,
    retention: Option<NonZeroUsize>,
) -> Result<(HistoryStore, ReplayOutcome), ReplayError> {
    let (history, outcome) = tokio::task::spawn_blocking(move || {
        let log = SnapshotLog::new(path);
        let mut history = HistoryStore::with_retention(retention);
        replay_log(&log, &mut history).map(|outcome| (history, outcome))
    })
    .await??;

    info!(
        replayed = outcome.replayed,
        skipped = outcome.skipped,
        retained = history.len(),
        "Snapshot log replayed"
    );

    Ok((history, outcome))
}
