//! Lazy, line-at-a-time reader over a JSONL snapshot log.
//!
//! The agent appends one JSON-encoded [`Snapshot`] per line. Reading
//! never loads the file as a single string: [`SnapshotLines`] pulls one
//! line through a [`BufReader`], attempts a decode, and either yields the
//! snapshot or skips the line and moves on. A bad line never aborts the
//! read.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::iter::FusedIterator;
use std::path::{Path, PathBuf};

use astryx_types::Snapshot;
use tracing::{debug, warn};

use crate::error::LogError;

/// Handle to a snapshot log file on disk.
///
/// The handle is cheap and holds no open file. Each call to
/// [`SnapshotLog::iter`] opens the file afresh, so the sequence can be
/// read any number of times and picks up lines appended in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLog {
    path: PathBuf,
}

impl SnapshotLog {
    /// Create a handle for the log at `path`. The file need not exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the log and return a lazy iterator over its snapshots, in
    /// file order.
    ///
    /// A log file that does not exist yields an empty iterator.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Open`] if the file exists but cannot be opened.
    pub fn iter(&self) -> Result<SnapshotLines, LogError> {
        match File::open(&self.path) {
            Ok(file) => Ok(SnapshotLines::from_reader(BufReader::new(file))),
            Err(source) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "snapshot log not found, nothing to read");
                Ok(SnapshotLines::empty())
            }
            Err(source) => Err(LogError::Open {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// Iterator over the decodable snapshots of a log file.
///
/// Blank lines are ignored. Lines that are not valid UTF-8 or do not
/// decode as a [`Snapshot`] are counted in [`SnapshotLines::skipped`].
/// A non-recoverable I/O error ends the iteration early.
#[derive(Debug)]
pub struct SnapshotLines {
    lines: Option<Lines<BufReader<File>>>,
    lines_read: u64,
    skipped: u64,
}

impl SnapshotLines {
    fn from_reader(reader: BufReader<File>) -> Self {
        Self {
            lines: Some(reader.lines()),
            lines_read: 0,
            skipped: 0,
        }
    }

    const fn empty() -> Self {
        Self {
            lines: None,
            lines_read: 0,
            skipped: 0,
        }
    }

    /// Number of lines consumed so far, including blank and skipped ones.
    pub const fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Number of malformed lines skipped so far.
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl Iterator for SnapshotLines {
    type Item = Snapshot;

    fn next(&mut self) -> Option<Snapshot> {
        let lines = self.lines.as_mut()?;

        for line in lines.by_ref() {
            self.lines_read = self.lines_read.saturating_add(1);
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    self.skipped = self.skipped.saturating_add(1);
                    debug!(line = self.lines_read, error = %e, "skipping non-UTF-8 snapshot line");
                    continue;
                }
                Err(e) => {
                    warn!(line = self.lines_read, error = %e, "snapshot log read failed, stopping");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match Snapshot::from_line(&line) {
                Ok(snapshot) => return Some(snapshot),
                Err(e) => {
                    self.skipped = self.skipped.saturating_add(1);
                    debug!(line = self.lines_read, error = %e, "skipping malformed snapshot line");
                }
            }
        }

        self.lines = None;
        None
    }
}

impl FusedIterator for SnapshotLines {}
