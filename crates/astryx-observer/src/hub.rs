//! Registry of live viewer connections and snapshot fan-out.
//!
//! Each viewer registers with the [`BroadcastHub`] and receives a
//! bounded queue of encoded frames. [`BroadcastHub::publish`] encodes a
//! snapshot once and offers it to every registered queue with a
//! non-blocking `try_send`:
//!
//! - a full queue means the viewer is not ready; it misses this frame
//!   but stays registered
//! - a closed queue means the viewer is gone; it is removed
//!
//! Neither case fails the publish. The hub knows nothing about the
//! transport; the `WebSocket` handler in [`crate::ws`] drains the queue.

use std::collections::HashMap;
use std::sync::Arc;

use astryx_types::{ConnectionId, Snapshot};
use tokio::sync::{mpsc, RwLock};
use tracing::debug;

/// Default per-connection queue depth, in frames.
pub const DEFAULT_CONNECTION_BUFFER: usize = 64;

/// A registered viewer's end of the hub.
///
/// Dropping the receiver closes the queue; the hub removes the
/// connection on its next publish, or immediately via
/// [`BroadcastHub::unregister`].
#[derive(Debug)]
pub struct Subscription {
    /// Identifier the connection is registered under.
    pub id: ConnectionId,
    /// JSON-encoded snapshots, in publish order.
    pub receiver: mpsc::Receiver<Arc<str>>,
}

/// Delivery outcome of one [`BroadcastHub::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Connections the frame was queued for.
    pub delivered: usize,
    /// Connections whose queue was full; they stay registered.
    pub skipped: usize,
    /// Connections found closed and removed from the registry.
    pub removed: usize,
}

/// Registry of open viewer connections.
#[derive(Debug)]
pub struct BroadcastHub {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<Arc<str>>>>,
    connection_buffer: usize,
}

impl BroadcastHub {
    /// Create an empty hub whose per-connection queues hold
    /// `connection_buffer` frames (at least one).
    pub fn new(connection_buffer: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            connection_buffer: connection_buffer.max(1),
        }
    }

    /// Per-connection queue depth.
    pub const fn connection_buffer(&self) -> usize {
        self.connection_buffer
    }

    /// Register a new connection.
    ///
    /// The connection receives every snapshot published after this call
    /// returns. Earlier snapshots are not replayed.
    pub async fn register(&self) -> Subscription {
        let (tx, receiver) = mpsc::channel(self.connection_buffer);
        let id = ConnectionId::new();
        self.connections.write().await.insert(id, tx);
        debug!(connection = %id, "viewer registered");
        Subscription { id, receiver }
    }

    /// Remove a connection. Returns `false` if it was not registered
    /// (for example because a publish already found it closed).
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(&id).is_some();
        if removed {
            debug!(connection = %id, "viewer unregistered");
        }
        removed
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Offer `snapshot` to every currently registered connection.
    ///
    /// Holds the registry lock for the duration of the fan-out, so a
    /// connection registering concurrently either sees this snapshot in
    /// full or not at all. Sends never wait on a slow viewer.
    ///
    /// # Errors
    ///
    /// Returns the encoding error if the snapshot cannot be serialized;
    /// nothing is sent in that case.
    pub async fn publish(&self, snapshot: &Snapshot) -> Result<PublishReport, serde_json::Error> {
        let frame: Arc<str> = Arc::from(snapshot.to_line()?);
        let mut report = PublishReport::default();

        let mut connections = self.connections.write().await;
        connections.retain(|id, tx| match tx.try_send(Arc::clone(&frame)) {
            Ok(()) => {
                report.delivered = report.delivered.saturating_add(1);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                report.skipped = report.skipped.saturating_add(1);
                debug!(connection = %id, "viewer queue full, frame dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                report.removed = report.removed.saturating_add(1);
                debug!(connection = %id, "viewer closed, removing");
                false
            }
        });

        Ok(report)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION_BUFFER)
    }
}
