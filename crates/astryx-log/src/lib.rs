//! Reader for the durable ASTRYX snapshot log.
//!
//! The agent writes one JSON-encoded snapshot per line to an append-only
//! UTF-8 file. This crate turns that file back into an ordered sequence of
//! [`Snapshot`](astryx_types::Snapshot) values for startup replay:
//!
//! - a missing file is an empty log, not an error
//! - malformed lines are skipped and counted, never fatal
//! - lines are read lazily, one at a time, so arbitrarily large logs use
//!   bounded memory
//!
//! The reader never writes to or truncates the log.

pub mod error;
pub mod reader;

pub use error::LogError;
pub use reader::{SnapshotLines, SnapshotLog};
