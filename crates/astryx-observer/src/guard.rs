//! Trait guard: threshold checks over a snapshot's mood and traits.
//!
//! The guard flags traits that have drifted outside configured bounds and
//! suggests a score to move each one back to. It is advisory only: the
//! gateway never changes a stored snapshot, it logs the warnings on
//! ingest and serves the report to the dashboard.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/guard/latest` | Guard report for the latest snapshot |
//! | `POST` | `/api/guard` | Guard report for a posted snapshot |

use std::sync::Arc;

use astryx_types::{GuardReport, Snapshot};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::ObserverError;
use crate::handlers::decode_snapshot;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Acceptable range for a single trait.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TraitBound {
    /// Trait name as it appears in `state_snapshot.traits`.
    pub name: String,
    /// Scores below this are flagged.
    #[serde(default)]
    pub min: Option<f64>,
    /// Scores above this are flagged.
    #[serde(default)]
    pub max: Option<f64>,
    /// Score suggested when the trait is out of range.
    pub suggested: f64,
}

/// Guard thresholds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GuardPolicy {
    /// Moods below this are flagged (`None` disables the check).
    #[serde(default = "default_mood_floor")]
    pub mood_floor: Option<f64>,
    /// Per-trait bounds, checked in order.
    #[serde(default = "default_trait_bounds")]
    pub traits: Vec<TraitBound>,
}

#[allow(clippy::unnecessary_wraps)]
const fn default_mood_floor() -> Option<f64> {
    Some(-0.7)
}

fn default_trait_bounds() -> Vec<TraitBound> {
    vec![
        TraitBound {
            name: "empathy".to_owned(),
            min: Some(0.4),
            max: None,
            suggested: 0.45,
        },
        TraitBound {
            name: "directness".to_owned(),
            min: None,
            max: Some(0.9),
            suggested: 0.85,
        },
    ]
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self {
            mood_floor: default_mood_floor(),
            traits: default_trait_bounds(),
        }
    }
}

impl GuardPolicy {
    /// Check `snapshot` against the policy.
    ///
    /// Traits the snapshot does not report are not checked. The report is
    /// `ok` when no warning was raised.
    pub fn evaluate(&self, snapshot: &Snapshot) -> GuardReport {
        let mut report = GuardReport::default();

        for bound in &self.traits {
            let Some(score) = snapshot.trait_score(&bound.name) else {
                continue;
            };
            if let Some(min) = bound.min
                && score < min
            {
                report.warnings.push(format!(
                    "{} too low ({score:.2}), suggest increasing",
                    bound.name
                ));
                report
                    .suggested_trait_adjustments
                    .insert(bound.name.clone(), bound.suggested);
            } else if let Some(max) = bound.max
                && score > max
            {
                report.warnings.push(format!(
                    "{} too high ({score:.2}), suggest decreasing",
                    bound.name
                ));
                report
                    .suggested_trait_adjustments
                    .insert(bound.name.clone(), bound.suggested);
            }
        }

        if let (Some(floor), Some(mood)) = (self.mood_floor, snapshot.mood())
            && mood < floor
        {
            report.warnings.push(format!(
                "mood very low ({mood:.2}), consider softening strategies"
            ));
        }

        report.ok = report.warnings.is_empty();
        report
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /api/guard/latest` -- guard report for the most recent snapshot.
pub async fn guard_latest(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let latest = state
        .history
        .read()
        .await
        .last()
        .ok_or_else(|| ObserverError::NotFound("no snapshots ingested yet".to_owned()))?;

    Ok(Json(state.guard.evaluate(&latest)))
}

/// `POST /api/guard` -- guard report for a posted snapshot.
///
/// The snapshot is only evaluated, never ingested.
pub async fn guard_check(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ObserverError> {
    let snapshot = decode_snapshot(&body)?;
    Ok(Json(state.guard.evaluate(&snapshot)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
