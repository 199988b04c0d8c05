//! Summary statistics over the snapshot history.
//!
//! [`summarize`] is a pure single pass: it takes whatever slice of
//! history the caller copied out under the read lock and never touches
//! shared state itself.

use std::collections::BTreeMap;
use std::sync::Arc;

use astryx_types::{Snapshot, Summary};

/// Compute count, mean mood, and goal frequencies over `history`.
///
/// - A snapshot without a mood contributes `0.0` to the mean but is
///   still counted.
/// - A snapshot without a goal is left out of the goal histogram.
/// - An empty history yields `count = 0`, `avg_mood = 0.0`, no goals.
///
/// The mean is folded incrementally, so a history of finite moods always
/// yields a finite mean.
#[allow(clippy::cast_precision_loss)]
pub fn summarize(history: &[Arc<Snapshot>]) -> Summary {
    let mut avg_mood = 0.0_f64;
    let mut goals: BTreeMap<String, usize> = BTreeMap::new();

    for (index, snapshot) in history.iter().enumerate() {
        let weight = index.saturating_add(1) as f64;
        let mood = snapshot.mood().unwrap_or(0.0);
        // Each term stays within the magnitude of the running mean or the
        // new mood, so no intermediate exceeds `f64::MAX`.
        avg_mood = avg_mood - avg_mood / weight + mood / weight;

        if let Some(goal) = &snapshot.goal {
            let count = goals.entry(goal.clone()).or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    Summary {
        count: history.len(),
        avg_mood,
        goals,
    }
}
