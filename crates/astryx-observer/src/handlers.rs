//! HTTP endpoint handlers for the gateway.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `POST` | `/ingest` | Accept one snapshot; `204 No Content` |
//! | `GET` | `/summary` | Count, mean mood, goal frequencies |
//! | `GET` | `/api/history` | Ordered history (`?limit=N` for the newest N) |
//! | `GET` | `/api/latest` | Latest snapshot plus its display fields |
//! | `GET` | `/api/status` | Service counters and timestamps |

use std::collections::BTreeMap;
use std::sync::Arc;

use astryx_types::Snapshot;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator;
use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Return only the newest `limit` snapshots (default: all).
    pub limit: Option<usize>,
}

/// Response body for `GET /api/history`.
#[derive(Debug, Serialize)]
struct HistoryResponse<'a> {
    count: usize,
    total_ingested: u64,
    snapshots: Vec<&'a Snapshot>,
}

/// The three fields the display layer renders.
#[derive(Debug, Serialize)]
struct DisplayView<'a> {
    mood: Option<f64>,
    traits: Option<&'a BTreeMap<String, f64>>,
    intention: Option<String>,
}

/// Response body for `GET /api/latest`.
#[derive(Debug, Serialize)]
struct LatestResponse<'a> {
    snapshot: &'a Snapshot,
    display: DisplayView<'a>,
}

/// Response body for `GET /api/status`.
#[derive(Debug, Serialize)]
struct StatusResponse {
    count: usize,
    total_ingested: u64,
    evicted: u64,
    retention: Option<usize>,
    viewers: usize,
    connection_buffer: usize,
    started_at: DateTime<Utc>,
    last_ingested_at: Option<DateTime<Utc>>,
    uptime_seconds: i64,
}

/// Decode a request body into a [`Snapshot`].
///
/// Missing and `null` fields are tolerated; anything that is not a JSON
/// object of the right shape is rejected.
pub(crate) fn decode_snapshot(body: &[u8]) -> Result<Snapshot, ObserverError> {
    serde_json::from_slice(body).map_err(|e| ObserverError::InvalidPayload(e.to_string()))
}

// ---------------------------------------------------------------------------
// POST /ingest
// ---------------------------------------------------------------------------

/// Ingest one snapshot: append it to history, then push it to every
/// live viewer.
///
/// Responds `204 No Content` once both steps have been attempted. A
/// malformed body is rejected with `400` and nothing is stored.
pub async fn ingest(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, ObserverError> {
    let snapshot = match decode_snapshot(&body) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!(error = %e, bytes = body.len(), "dropping malformed snapshot");
            return Err(e);
        }
    };

    state.ingest(snapshot).await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /summary
// ---------------------------------------------------------------------------

/// Return `{count, avgMood, goals}` computed over the current history.
pub async fn summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.summary().await)
}

// ---------------------------------------------------------------------------
// GET /api/history
// ---------------------------------------------------------------------------

/// Return history in ingestion order, optionally only the newest
/// `limit` records.
pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let (records, total_ingested) = {
        let history = state.history.read().await;
        let records = match query.limit {
            Some(0) => {
                return Err(ObserverError::InvalidQuery(
                    "limit must be at least 1".to_owned(),
                ));
            }
            Some(limit) => history.recent(limit),
            None => history.all(),
        };
        (records, history.total_ingested())
    };

    let body = serde_json::to_value(HistoryResponse {
        count: records.len(),
        total_ingested,
        snapshots: records.iter().map(Arc::as_ref).collect(),
    })?;

    Ok(Json(body))
}

// ---------------------------------------------------------------------------
// GET /api/latest
// ---------------------------------------------------------------------------

/// Return the most recent snapshot together with the display fields the
/// dashboard renders (mood, traits, intention).
pub async fn latest(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let latest = state
        .history
        .read()
        .await
        .last()
        .ok_or_else(|| ObserverError::NotFound("no snapshots ingested yet".to_owned()))?;

    let body = LatestResponse {
        snapshot: &latest,
        display: DisplayView {
            mood: latest.mood(),
            traits: latest.traits(),
            intention: latest.intention(),
        },
    };
    Ok(Json(serde_json::to_value(body)?))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return history counters, viewer count, and timestamps.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (count, total_ingested, evicted, retention) = {
        let history = state.history.read().await;
        (
            history.len(),
            history.total_ingested(),
            history.evicted(),
            history.retention().map(std::num::NonZeroUsize::get),
        )
    };
    let now = Utc::now();

    Json(StatusResponse {
        count,
        total_ingested,
        evicted,
        retention,
        viewers: state.hub.connection_count().await,
        connection_buffer: state.hub.connection_buffer(),
        started_at: state.started_at,
        last_ingested_at: *state.last_ingested_at.read().await,
        uptime_seconds: now.signed_duration_since(state.started_at).num_seconds(),
    })
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Escape text for inclusion in HTML.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Serve a minimal HTML page with live counters and endpoint links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let records = state.history.read().await.all();
    let summary = aggregator::summarize(&records);
    let latest = records.last();
    let viewers = state.hub.connection_count().await;

    let count = summary.count;
    let avg_mood = format!("{:.2}", summary.avg_mood);
    let goal = escape_html(latest.and_then(|s| s.goal.as_deref()).unwrap_or("-"));
    let intention = escape_html(
        &latest
            .and_then(|s| s.intention())
            .unwrap_or_else(|| "-".to_owned()),
    );

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>ASTRYX Gateway</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>ASTRYX Gateway</h1>
    <p class="subtitle">Snapshot ingestion and live fan-out</p>

    <div>
        <div class="metric">
            <div class="label">Snapshots</div>
            <div class="value">{count}</div>
        </div>
        <div class="metric">
            <div class="label">Avg mood</div>
            <div class="value">{avg_mood}</div>
        </div>
        <div class="metric">
            <div class="label">Viewers</div>
            <div class="value">{viewers}</div>
        </div>
        <div class="metric">
            <div class="label">Current goal</div>
            <div class="value">{goal}</div>
        </div>
    </div>

    <p>Intention: {intention}</p>

    <hr>

    <h2>Endpoints</h2>
    <ul>
        <li>POST /ingest -- Submit a snapshot</li>
        <li>GET <a href="/summary">/summary</a> -- Count, mean mood, goal frequencies</li>
        <li>GET <a href="/api/history">/api/history</a> -- Ordered history (?limit=N)</li>
        <li>GET <a href="/api/latest">/api/latest</a> -- Latest snapshot</li>
        <li>GET <a href="/api/guard/latest">/api/guard/latest</a> -- Trait guard report</li>
        <li>GET <a href="/api/status">/api/status</a> -- Service status</li>
        <li>WS /ws/snapshots -- Live snapshot stream</li>
    </ul>
</body>
</html>"#
    ))
}
