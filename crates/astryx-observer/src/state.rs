//! Shared application state for the gateway.
//!
//! [`AppState`] owns the snapshot history, the viewer registry, and the
//! trait guard policy. It is wrapped in [`Arc`] and injected into every
//! handler through Axum's `State` extractor.
//!
//! # Ordering
//!
//! Ingestion is single-writer: [`AppState::ingest`] holds the ingest gate
//! while it appends to history and publishes to viewers, so the next
//! record cannot mutate history until the previous one has been fully
//! handled. Broadcast order therefore always equals history order.
//! Readers take the history read lock only long enough to copy out the
//! record pointers; an append is a single write-locked insertion, so a
//! reader sees all of it or none of it.

use std::sync::Arc;

use astryx_types::{Snapshot, Summary};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::aggregator;
use crate::guard::GuardPolicy;
use crate::history::HistoryStore;
use crate::hub::{BroadcastHub, PublishReport};

/// Result of ingesting one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Ingestion sequence number assigned by the history store.
    pub sequence: u64,
    /// Fan-out result; `None` if the snapshot could not be encoded for
    /// viewers (it is still stored).
    pub delivery: Option<PublishReport>,
}

/// Shared state for the Axum application.
#[derive(Debug)]
pub struct AppState {
    /// Ingested snapshots in arrival order.
    pub history: Arc<RwLock<HistoryStore>>,
    /// Registry of live viewer connections.
    pub hub: Arc<BroadcastHub>,
    /// Trait guard thresholds.
    pub guard: GuardPolicy,
    /// When this state was created.
    pub started_at: DateTime<Utc>,
    /// When the most recent snapshot was ingested through the endpoint.
    pub last_ingested_at: RwLock<Option<DateTime<Utc>>>,
    /// Serialises append-then-publish across concurrent ingest requests.
    ingest_gate: Mutex<()>,
}

impl AppState {
    /// Create a state with an empty, unbounded history, a default hub,
    /// and the default guard policy.
    pub fn new() -> Self {
        Self::from_parts(HistoryStore::new(), BroadcastHub::default(), GuardPolicy::default())
    }

    /// Assemble a state from pre-built parts, e.g. a history already
    /// populated by log replay.
    pub fn from_parts(history: HistoryStore, hub: BroadcastHub, guard: GuardPolicy) -> Self {
        Self {
            history: Arc::new(RwLock::new(history)),
            hub: Arc::new(hub),
            guard,
            started_at: Utc::now(),
            last_ingested_at: RwLock::new(None),
            ingest_gate: Mutex::new(()),
        }
    }

    /// Append `snapshot` to history, then publish it to every viewer.
    ///
    /// Always succeeds from the producer's point of view: encoding or
    /// per-viewer delivery failures are logged and reported in the
    /// outcome, never returned as errors.
    pub async fn ingest(&self, snapshot: Snapshot) -> IngestOutcome {
        let _gate = self.ingest_gate.lock().await;

        let snapshot = Arc::new(snapshot);
        let sequence = self.history.write().await.append(Arc::clone(&snapshot));
        *self.last_ingested_at.write().await = Some(Utc::now());

        let delivery = match self.hub.publish(&snapshot).await {
            Ok(report) => {
                debug!(
                    sequence,
                    delivered = report.delivered,
                    skipped = report.skipped,
                    removed = report.removed,
                    "snapshot broadcast"
                );
                Some(report)
            }
            Err(e) => {
                warn!(sequence, error = %e, "failed to encode snapshot for viewers");
                None
            }
        };

        let report = self.guard.evaluate(&snapshot);
        for warning in &report.warnings {
            warn!(
                sequence,
                agent = snapshot.agent_name.as_deref().unwrap_or("unknown"),
                %warning,
                "trait guard"
            );
        }

        IngestOutcome { sequence, delivery }
    }

    /// Summary statistics over the current history.
    pub async fn summary(&self) -> Summary {
        let records = self.history.read().await.all();
        aggregator::summarize(&records)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
