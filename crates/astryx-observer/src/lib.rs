//! Snapshot ingestion and aggregation service for the ASTRYX agent.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Ingestion** (`POST /ingest`): accepts one snapshot, appends it to
//!   the in-memory history, and pushes it to every live viewer
//! - **Summary** (`GET /summary`): count, mean mood, and goal
//!   frequencies over the current history
//! - **`WebSocket` endpoint** (`/ws/snapshots`) for real-time snapshot
//!   streaming through the [`BroadcastHub`]
//! - **Dashboard pull endpoints** for history, the latest snapshot, trait
//!   guard reports, and service status
//!
//! # Architecture
//!
//! [`AppState`] owns a [`HistoryStore`] behind a read-write lock and a
//! [`BroadcastHub`] registry of viewer queues. Ingestion is
//! single-writer (append, then publish, under one gate); summaries copy
//! the record pointers out under the read lock and aggregate without
//! holding it. Viewers that are slow miss frames instead of stalling
//! ingestion; viewers that are gone are removed.
//!
//! At startup, [`replay::load_history`] rebuilds history from the
//! agent's durable JSONL log.

pub mod aggregator;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod history;
pub mod hub;
pub mod replay;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use guard::{GuardPolicy, TraitBound};
pub use history::HistoryStore;
pub use hub::{BroadcastHub, PublishReport, Subscription};
pub use router::build_router;
pub use server::{start_server, ServerConfig, ServerError};
pub use state::{AppState, IngestOutcome};
