//! Integration tests for the gateway API endpoints.
//!
//! Most tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. The `WebSocket` tests serve the router on an
//! ephemeral local port and connect a real client.

#![allow(clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use astryx_observer::router::build_router;
use astryx_observer::state::AppState;
use astryx_types::Snapshot;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

fn snapshot_json(goal: &str, mood: f64, empathy: f64) -> Value {
    json!({
        "agent_name": "ASTRYX",
        "identity_reason": "self-correcting star map",
        "user_input": "I feel tired",
        "perception": {"emotion": "sad", "intent": "statement"},
        "goal": goal,
        "plan": {
            "intention": format!("use {goal} strategy with empathy={empathy:.2}"),
            "alternatives_considered": ["clarify", "mirror"],
        },
        "reply": "I can feel the weight in what you're saying.",
        "state_snapshot": {
            "mood": mood,
            "traits": {"empathy": empathy, "directness": 0.3, "caution": 0.7},
        },
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn ingest(state: &Arc<AppState>, body: &Value) -> StatusCode {
    build_router(Arc::clone(state))
        .oneshot(post_json("/ingest", body))
        .await
        .unwrap()
        .status()
}

async fn get_json(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = build_router(Arc::clone(state))
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let state = Arc::new(AppState::new());
    let response = build_router(state)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_ingest_returns_no_content_without_viewers() {
    let state = Arc::new(AppState::new());

    let status = ingest(&state, &snapshot_json("comfort", -0.05, 0.8)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(state.history.read().await.len(), 1);
}

#[tokio::test]
async fn test_ingest_preserves_order() {
    let state = Arc::new(AppState::new());
    let goals = ["comfort", "clarify", "mirror", "comfort", "clarify"];
    for goal in goals {
        assert_eq!(
            ingest(&state, &snapshot_json(goal, 0.0, 0.8)).await,
            StatusCode::NO_CONTENT
        );
    }

    let stored: Vec<String> = state
        .history
        .read()
        .await
        .all()
        .iter()
        .filter_map(|s| s.goal.clone())
        .collect();
    assert_eq!(stored, goals.map(str::to_owned));
}

#[tokio::test]
async fn test_ingest_tolerates_missing_fields() {
    let state = Arc::new(AppState::new());
    let status = ingest(&state, &json!({"goal": "rest", "unexpected": [1, 2]})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let last = state.history.read().await.last().unwrap();
    assert_eq!(last.goal.as_deref(), Some("rest"));
    assert!(last.agent_name.is_none());
}

#[tokio::test]
async fn test_ingest_rejects_malformed_body() {
    let state = Arc::new(AppState::new());
    let response = build_router(Arc::clone(&state))
        .oneshot(
            Request::post("/ingest")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 400);
    assert!(state.history.read().await.is_empty());

    let status = ingest(&state, &json!({"state_snapshot": {"mood": "low"}})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(state.history.read().await.is_empty());
}

#[tokio::test]
async fn test_summary_empty_history() {
    let state = Arc::new(AppState::new());
    let (status, json) = get_json(&state, "/summary").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({"count": 0, "avgMood": 0.0, "goals": {}}));
}

#[tokio::test]
async fn test_summary_after_ingest() {
    let state = Arc::new(AppState::new());
    for (goal, mood) in [("explore", 0.2), ("explore", -0.4), ("rest", 1.0)] {
        ingest(&state, &snapshot_json(goal, mood, 0.8)).await;
    }

    let (status, json) = get_json(&state, "/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    let avg = json["avgMood"].as_f64().unwrap();
    assert!((avg - 0.8 / 3.0).abs() < 1e-12);
    assert_eq!(json["goals"], json!({"explore": 2, "rest": 1}));
}

#[tokio::test]
async fn test_viewer_receives_ingested_snapshot() {
    let state = Arc::new(AppState::new());
    ingest(&state, &snapshot_json("A", 0.0, 0.8)).await;

    let mut viewer = state.hub.register().await;
    ingest(&state, &snapshot_json("B", 0.0, 0.8)).await;

    let frame = viewer.receiver.recv().await.unwrap();
    let pushed = Snapshot::from_line(&frame).unwrap();
    assert_eq!(pushed.goal.as_deref(), Some("B"));
    assert!(viewer.receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_closed_viewer_does_not_fail_ingest() {
    let state = Arc::new(AppState::new());
    let gone = state.hub.register().await;
    drop(gone.receiver);

    let status = ingest(&state, &snapshot_json("mirror", 0.0, 0.8)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(state.hub.connection_count().await, 0);
}

#[tokio::test]
async fn test_history_limit() {
    let state = Arc::new(AppState::new());
    for goal in ["a", "b", "c"] {
        ingest(&state, &snapshot_json(goal, 0.0, 0.8)).await;
    }

    let (status, json) = get_json(&state, "/api/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    assert_eq!(json["snapshots"][0]["goal"], "a");

    let (_, json) = get_json(&state, "/api/history?limit=2").await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["total_ingested"], 3);
    assert_eq!(json["snapshots"][0]["goal"], "b");
    assert_eq!(json["snapshots"][1]["goal"], "c");

    let (status, _) = get_json(&state, "/api/history?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_latest_empty_is_not_found() {
    let state = Arc::new(AppState::new());
    let (status, json) = get_json(&state, "/api/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn test_latest_exposes_display_fields() {
    let state = Arc::new(AppState::new());
    ingest(&state, &snapshot_json("comfort", -0.1, 0.8)).await;
    ingest(&state, &snapshot_json("clarify", 0.05, 0.75)).await;

    let (status, json) = get_json(&state, "/api/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["snapshot"]["goal"], "clarify");
    assert_eq!(json["display"]["mood"], 0.05);
    assert_eq!(json["display"]["traits"]["empathy"], 0.75);
    assert_eq!(
        json["display"]["intention"],
        "use clarify strategy with empathy=0.75"
    );
}

#[tokio::test]
async fn test_guard_latest_flags_low_empathy() {
    let state = Arc::new(AppState::new());
    let (status, _) = get_json(&state, "/api/guard/latest").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ingest(&state, &snapshot_json("comfort", -0.8, 0.3)).await;
    let (status, json) = get_json(&state, "/api/guard/latest").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ok"], false);
    assert_eq!(json["warnings"].as_array().unwrap().len(), 2);
    assert_eq!(json["suggested_trait_adjustments"]["empathy"], 0.45);
}

#[tokio::test]
async fn test_guard_check_does_not_ingest() {
    let state = Arc::new(AppState::new());
    let response = build_router(Arc::clone(&state))
        .oneshot(post_json("/api/guard", &snapshot_json("mirror", 0.1, 0.8)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    assert!(state.history.read().await.is_empty());
}

#[tokio::test]
async fn test_status_counts() {
    let state = Arc::new(AppState::new());
    let _viewer = state.hub.register().await;
    ingest(&state, &snapshot_json("rest", 0.0, 0.8)).await;

    let (status, json) = get_json(&state, "/api/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["total_ingested"], 1);
    assert_eq!(json["viewers"], 1);
    assert!(json["retention"].is_null());
    assert!(json["last_ingested_at"].is_string());
}

/// Pull the text of every `<div class="value">` metric on the index page.
fn metric_values(html: &str) -> Vec<String> {
    html.split(r#"<div class="value">"#)
        .skip(1)
        .filter_map(|rest| rest.split("</div>").next())
        .map(str::to_owned)
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_index_count_matches_current_goal_during_ingest() {
    let state = Arc::new(AppState::new());

    let writer = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            for i in 1..=200 {
                let snapshot = Snapshot {
                    goal: Some(format!("g{i}")),
                    ..Snapshot::default()
                };
                state.ingest(snapshot).await;
                tokio::task::yield_now().await;
            }
        })
    };

    while !writer.is_finished() {
        let response = build_router(Arc::clone(&state))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();

        let values = metric_values(&html);
        let (count, goal) = (&values[0], &values[3]);
        if count == "0" {
            assert_eq!(goal, "-");
        } else {
            assert_eq!(goal, &format!("g{count}"));
        }
    }
    writer.await.unwrap();
}

/// Serve the router on an ephemeral local port.
async fn spawn_server(state: &Arc<AppState>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(Arc::clone(state));
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Wait until the hub holds exactly `expected` viewers.
async fn wait_for_viewers(state: &AppState, expected: usize) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while state.hub.connection_count().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_websocket_streams_snapshots_and_unregisters_on_close() {
    let state = Arc::new(AppState::new());
    let addr = spawn_server(&state).await;

    ingest(&state, &snapshot_json("A", 0.0, 0.8)).await;

    let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/snapshots"))
        .await
        .unwrap();
    wait_for_viewers(&state, 1).await;

    ingest(&state, &snapshot_json("B", 0.963_690_677_468_955_5, 0.8)).await;

    let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(frame.is_text());
    let pushed = Snapshot::from_line(frame.to_text().unwrap()).unwrap();
    assert_eq!(pushed.goal.as_deref(), Some("B"));
    assert_eq!(
        pushed.mood().map(f64::to_bits),
        Some(0.963_690_677_468_955_5_f64.to_bits())
    );

    socket.send(Message::Close(None)).await.unwrap();
    wait_for_viewers(&state, 0).await;
}

#[tokio::test]
async fn test_websocket_dropped_client_is_unregistered() {
    let state = Arc::new(AppState::new());
    let addr = spawn_server(&state).await;

    let (first, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/snapshots"))
        .await
        .unwrap();
    let (mut second, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/snapshots"))
        .await
        .unwrap();
    wait_for_viewers(&state, 2).await;

    // Drop the transport without a close handshake.
    drop(first);
    wait_for_viewers(&state, 1).await;

    assert_eq!(
        ingest(&state, &snapshot_json("mirror", 0.0, 0.8)).await,
        StatusCode::NO_CONTENT
    );
    let frame = tokio::time::timeout(Duration::from_secs(5), second.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let pushed = Snapshot::from_line(frame.to_text().unwrap()).unwrap();
    assert_eq!(pushed.goal.as_deref(), Some("mirror"));
}
