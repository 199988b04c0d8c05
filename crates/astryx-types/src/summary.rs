//! Derived, read-only views computed over the snapshot history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Aggregate statistics over the full history, as returned by
/// `GET /summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Summary {
    /// Number of snapshots in history.
    pub count: usize,
    /// Arithmetic mean of `state_snapshot.mood`; `0` for an empty history.
    #[serde(rename = "avgMood")]
    pub avg_mood: f64,
    /// Distinct goal to number of snapshots carrying it.
    pub goals: BTreeMap<String, usize>,
}

/// Outcome of running the trait guard over one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GuardReport {
    /// `true` when no warnings were raised.
    pub ok: bool,
    /// Human-readable warnings, in policy order.
    pub warnings: Vec<String>,
    /// Trait name to the score the guard suggests moving it to.
    pub suggested_trait_adjustments: BTreeMap<String, f64>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn summary_uses_camel_case_mean() {
        let summary = Summary {
            count: 2,
            avg_mood: 0.5,
            goals: BTreeMap::from([("rest".to_owned(), 2)]),
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["avgMood"], 0.5);
        assert_eq!(json["goals"]["rest"], 2);
        assert!(json.get("avg_mood").is_none());
    }

    #[test]
    fn empty_summary_shape() {
        let json = serde_json::to_value(Summary::default()).unwrap();
        assert_eq!(json, serde_json::json!({"count": 0, "avgMood": 0.0, "goals": {}}));
    }
}
