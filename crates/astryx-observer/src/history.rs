//! In-process, append-only history of ingested snapshots.
//!
//! Records are kept in strict ingestion order. Each record is stored
//! behind an [`Arc`] so readers can take a cheap, consistent copy of the
//! whole sequence and release the lock before doing any work on it.
//!
//! The store is unbounded by default. With a retention cap, the oldest
//! record is evicted once the cap is exceeded; the durable JSONL log
//! remains the full record.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use astryx_types::Snapshot;

/// Ordered, append-only collection of ingested snapshots.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    /// Retained records, oldest first.
    records: VecDeque<Arc<Snapshot>>,
    /// Maximum number of retained records (`None` for unbounded).
    retention: Option<NonZeroUsize>,
    /// Records appended over the store's lifetime.
    total_ingested: u64,
    /// Records dropped by the retention policy.
    evicted: u64,
}

impl HistoryStore {
    /// Create an empty, unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that retains at most `retention` records.
    pub fn with_retention(retention: Option<NonZeroUsize>) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    /// Append a snapshot and return its 1-based ingestion sequence number.
    ///
    /// Always succeeds. If a retention cap is set and exceeded, the oldest
    /// record is evicted.
    pub fn append(&mut self, snapshot: impl Into<Arc<Snapshot>>) -> u64 {
        self.records.push_back(snapshot.into());
        self.total_ingested = self.total_ingested.saturating_add(1);

        if let Some(cap) = self.retention {
            while self.records.len() > cap.get() {
                self.records.pop_front();
                self.evicted = self.evicted.saturating_add(1);
            }
        }

        self.total_ingested
    }

    /// Append every snapshot from `snapshots`, in order.
    ///
    /// Returns the number of records appended.
    pub fn extend<I>(&mut self, snapshots: I) -> u64
    where
        I: IntoIterator,
        I::Item: Into<Arc<Snapshot>>,
    {
        let before = self.total_ingested;
        for snapshot in snapshots {
            self.append(snapshot);
        }
        self.total_ingested.saturating_sub(before)
    }

    /// Every retained record in ingestion order.
    pub fn all(&self) -> Vec<Arc<Snapshot>> {
        self.records.iter().cloned().collect()
    }

    /// The newest `limit` records, still in ingestion order.
    pub fn recent(&self, limit: usize) -> Vec<Arc<Snapshot>> {
        let skip = self.records.len().saturating_sub(limit);
        self.records.iter().skip(skip).cloned().collect()
    }

    /// The most recently appended record, or `None` if nothing has been
    /// ingested yet (or everything was evicted).
    pub fn last(&self) -> Option<Arc<Snapshot>> {
        self.records.back().cloned()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records are retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Configured retention cap.
    pub const fn retention(&self) -> Option<NonZeroUsize> {
        self.retention
    }

    /// Records appended over the store's lifetime, including evicted ones.
    pub const fn total_ingested(&self) -> u64 {
        self.total_ingested
    }

    /// Records dropped by the retention policy.
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }
}
