//! Integration tests for the snapshot log reader.
//!
//! Each test writes a log into a temporary directory and reads it back
//! through the public [`SnapshotLog`] API.

#![allow(clippy::unwrap_used)]

use std::io::Write;

use astryx_log::SnapshotLog;
use serde_json::json;

fn snapshot_line(goal: &str, mood: f64) -> String {
    json!({
        "agent_name": "ASTRYX",
        "identity_reason": "self-correcting star map",
        "user_input": "hello",
        "perception": {"emotion": "neutral", "intent": "statement"},
        "goal": goal,
        "plan": {"intention": format!("use {goal} strategy")},
        "reply": "I'm reflecting this back to you because it matters.",
        "state_snapshot": {"mood": mood, "traits": {"empathy": 0.8}},
    })
    .to_string()
}

#[test]
fn valid_and_garbage_lines_yield_one_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("astrx_log.jsonl");
    let contents = format!("{}\nthis is not json at all\n", snapshot_line("mirror", 0.02));
    std::fs::write(&path, contents).unwrap();

    let mut lines = SnapshotLog::new(&path).iter().unwrap();
    let snapshots: Vec<_> = lines.by_ref().collect();

    assert_eq!(snapshots.len(), 1);
    assert_eq!(snapshots[0].goal.as_deref(), Some("mirror"));
    assert_eq!(lines.skipped(), 1);
}

#[test]
fn nonexistent_path_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log = SnapshotLog::new(dir.path().join("never-written.jsonl"));
    assert_eq!(log.iter().unwrap().count(), 0);
}

#[test]
fn snapshots_come_back_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("astrx_log.jsonl");
    let goals = ["comfort", "clarify", "mirror", "comfort"];
    let mut file = std::fs::File::create(&path).unwrap();
    for (i, goal) in goals.iter().enumerate() {
        writeln!(file, "{}", snapshot_line(goal, f64::from(u8::try_from(i).unwrap()) / 10.0))
            .unwrap();
        if i == 1 {
            writeln!(file, "{{\"state_snapshot\": {{\"mood\": \"very low\"}}}}").unwrap();
        }
    }
    drop(file);

    let read: Vec<String> = SnapshotLog::new(&path)
        .iter()
        .unwrap()
        .filter_map(|s| s.goal)
        .collect();
    assert_eq!(read, goals.map(str::to_owned));
}

#[test]
fn log_can_be_read_again_after_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("astrx_log.jsonl");
    std::fs::write(&path, format!("{}\n", snapshot_line("rest", 0.1))).unwrap();

    let log = SnapshotLog::new(&path);
    assert_eq!(log.iter().unwrap().count(), 1);

    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(file, "{}", snapshot_line("explore", 0.3)).unwrap();
    drop(file);

    let goals: Vec<String> = log.iter().unwrap().filter_map(|s| s.goal).collect();
    assert_eq!(goals, vec!["rest".to_owned(), "explore".to_owned()]);
}

#[test]
fn truncated_final_line_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("astrx_log.jsonl");
    let full = snapshot_line("comfort", -0.05);
    let partial = &full[..full.len() / 2];
    std::fs::write(&path, format!("{full}\n{partial}")).unwrap();

    let mut lines = SnapshotLog::new(&path).iter().unwrap();
    assert_eq!(lines.by_ref().count(), 1);
    assert_eq!(lines.skipped(), 1);
}

#[test]
fn byte_order_mark_on_first_line_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("astrx_log.jsonl");
    std::fs::write(&path, "\u{feff}{\"goal\":\"a\"}\n{\"goal\":\"b\"}\n").unwrap();

    let mut lines = SnapshotLog::new(&path).iter().unwrap();
    let goals: Vec<String> = lines.by_ref().filter_map(|s| s.goal).collect();
    assert_eq!(goals, vec!["a".to_owned(), "b".to_owned()]);
    assert_eq!(lines.skipped(), 0);
}

#[test]
fn full_precision_moods_replay_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("astrx_log.jsonl");
    let moods = [0.963_690_677_468_955_5, -0.1 - 0.2, 2.225_073_858_507_201e-308];
    let contents: String = moods
        .iter()
        .map(|m| format!("{}\n", snapshot_line("explore", *m)))
        .collect();
    std::fs::write(&path, contents).unwrap();

    let read: Vec<u64> = SnapshotLog::new(&path)
        .iter()
        .unwrap()
        .filter_map(|s| s.mood())
        .map(f64::to_bits)
        .collect();
    assert_eq!(read, moods.map(f64::to_bits));
}
