//! The snapshot record exchanged between the agent, the gateway, and
//! every consumer.
//!
//! A [`Snapshot`] is one observation of agent state. The agent emits it
//! once per step, appends it to its JSONL log, and posts it to the
//! gateway. The gateway never mutates a decoded snapshot.
//!
//! # Tolerant decoding
//!
//! Every field is optional. A field that is missing or `null` decodes to
//! `None` rather than failing the record, and unknown extra fields are
//! ignored. A field that is present with the wrong JSON type (for example
//! `"mood": "high"`) still fails the decode; callers drop such records.
//!
//! # Open mappings
//!
//! `perception` and `plan` are dynamically keyed. Their values are kept
//! as opaque [`serde_json::Value`]s and passed through untouched. Readers
//! should only rely on the `plan.intention` entry, which the display layer
//! renders as text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Name of the plan entry holding the agent's human-readable intention.
pub const INTENTION_KEY: &str = "intention";

/// Editors on some platforms prefix the first line of a UTF-8 file with this.
const BYTE_ORDER_MARK: char = '\u{feff}';

/// One observation of agent state at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Identifying name of the producing agent instance.
    #[serde(default)]
    pub agent_name: Option<String>,
    /// Free text explaining the agent's current self-identification.
    #[serde(default)]
    pub identity_reason: Option<String>,
    /// The most recent input the agent processed (may be empty).
    #[serde(default)]
    pub user_input: Option<String>,
    /// The agent's current sensory and contextual reading.
    #[serde(default)]
    pub perception: Option<BTreeMap<String, Value>>,
    /// The objective the agent is currently pursuing.
    #[serde(default)]
    pub goal: Option<String>,
    /// The agent's plan; by convention carries an `intention` entry.
    #[serde(default)]
    pub plan: Option<BTreeMap<String, Value>>,
    /// The agent's most recent output utterance.
    #[serde(default)]
    pub reply: Option<String>,
    /// Mood and trait scores at the time of the snapshot.
    #[serde(default)]
    pub state_snapshot: Option<StateSnapshot>,
}

/// Internal affective state carried inside a [`Snapshot`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StateSnapshot {
    /// Scalar mood. No range is enforced here; the agent emits values in
    /// `[-1, 1]`.
    #[serde(default)]
    pub mood: Option<f64>,
    /// Trait name to score.
    #[serde(default)]
    pub traits: Option<BTreeMap<String, f64>>,
}

impl Snapshot {
    /// Decode one JSONL record.
    ///
    /// Surrounding whitespace (including a trailing `\r`) and a leading
    /// UTF-8 byte order mark are ignored.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim().trim_start_matches(BYTE_ORDER_MARK))
    }

    /// Encode as a single-line JSON record without a trailing newline.
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// The snapshot's mood, if the agent reported one.
    pub fn mood(&self) -> Option<f64> {
        self.state_snapshot.as_ref().and_then(|s| s.mood)
    }

    /// The snapshot's trait scores, if the agent reported any.
    pub fn traits(&self) -> Option<&BTreeMap<String, f64>> {
        self.state_snapshot.as_ref().and_then(|s| s.traits.as_ref())
    }

    /// Score of a single trait.
    pub fn trait_score(&self, name: &str) -> Option<f64> {
        self.traits().and_then(|t| t.get(name)).copied()
    }

    /// Text form of `plan.intention`.
    ///
    /// A JSON string is returned as-is; any other value is rendered as
    /// compact JSON.
    pub fn intention(&self) -> Option<String> {
        let value = self.plan.as_ref()?.get(INTENTION_KEY)?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
