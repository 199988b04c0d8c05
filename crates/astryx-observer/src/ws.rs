//! `WebSocket` transport for the live snapshot stream.
//!
//! Clients connect to `GET /ws/snapshots` and receive one JSON-encoded
//! [`Snapshot`](astryx_types::Snapshot) text frame per ingested snapshot.
//! Each connection registers with the [`BroadcastHub`](crate::hub::BroadcastHub)
//! and drains its own queue, so a slow client only ever delays itself.
//!
//! Snapshots ingested before the connection opened are not replayed;
//! dashboards pull `/api/history` on connect instead.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::debug;

use crate::hub::Subscription;
use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming snapshots.
///
/// # Route
///
/// `GET /ws/snapshots`
pub async fn ws_snapshots(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle: register with the hub, forward each
/// queued frame, and unregister when either side goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let Subscription { id, mut receiver } = state.hub.register().await;
    debug!(connection = %id, "WebSocket viewer connected");

    loop {
        tokio::select! {
            frame = receiver.recv() => {
                let Some(frame) = frame else {
                    debug!(connection = %id, "viewer dropped by hub");
                    break;
                };
                let msg = Message::Text(frame.to_string().into());
                if socket.send(msg).await.is_err() {
                    debug!(connection = %id, "WebSocket viewer disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(connection = %id, "WebSocket viewer disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!(connection = %id, "WebSocket viewer disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(connection = %id, "WebSocket error: {e}");
                        break;
                    }
                    _ => {
                        // The stream is push-only; client text and binary frames are ignored.
                    }
                }
            }
        }
    }

    state.hub.unregister(id).await;
}
