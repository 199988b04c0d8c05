//! Type-safe identifier wrapper for live viewer connections.
//!
//! Connections are registered with the broadcast hub under a
//! [`ConnectionId`] so that registration, removal, and delivery reports
//! never mix up plain UUIDs from other sources.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for a live viewer connection.
///
/// Uses UUID v7 (time-ordered), so sorting IDs sorts connections by the
/// moment they were registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Create a new identifier using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let first = ConnectionId::new();
        let second = ConnectionId::new();
        assert_ne!(first, second);
    }

    #[test]
    fn display_matches_uuid() {
        let id = ConnectionId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }
}
