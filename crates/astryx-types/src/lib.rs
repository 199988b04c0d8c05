//! Shared type definitions for the ASTRYX snapshot gateway.
//!
//! This crate is the single source of truth for the record shape that
//! flows from the agent, through the gateway, to the dashboard. Types
//! defined here flow downstream to `TypeScript` via `ts-rs` so the live
//! dashboard decodes exactly what the gateway pushes.
//!
//! # Modules
//!
//! - [`snapshot`] -- The [`Snapshot`] record and its tolerant JSONL codec
//! - [`summary`] -- Aggregate and guard views computed over history
//! - [`ids`] -- Type-safe identifier for live viewer connections

pub mod ids;
pub mod snapshot;
pub mod summary;

// Re-export all public types at crate root for convenience.
pub use ids::ConnectionId;
pub use snapshot::{INTENTION_KEY, Snapshot, StateSnapshot};
pub use summary::{GuardReport, Summary};
