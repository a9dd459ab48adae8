//! WebSocket handler for live per-session message delivery.
//!
//! `GET /ws/sessions/{id}` upgrades to a WebSocket after the session is
//! verified to exist. The handler subscribes to the session bus and pushes
//! every newly appended message as a JSON text frame -- the same shape the
//! polling read returns, so a client can fall back to polling with its
//! last-seen `seq` at any time.
//!
//! Clients are not expected to send anything; inbound frames other than
//! Close are ignored. A subscriber that falls behind the bus buffer loses
//! the oldest messages (logged) and keeps receiving -- the poll endpoint
//! recovers the gap.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;

use opchat_types::chat::ChatMessage;

use crate::http::error::AppError;
use crate::http::handlers::session::parse_uuid;
use crate::state::AppState;

/// Upgrade an HTTP request to a WebSocket subscription for one session.
///
/// Unknown sessions are rejected with 404 before the upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let sid = parse_uuid(&session_id)?;
    let rx = state.chat_service.subscribe(&sid).await?;

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(socket, rx, sid)))
}

/// Core WebSocket connection loop.
///
/// Uses `tokio::select!` to multiplex between bus messages to forward and
/// inbound frames (only Close matters).
async fn handle_ws_connection(
    socket: WebSocket,
    mut rx: broadcast::Receiver<ChatMessage>,
    session_id: Uuid,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    loop {
        tokio::select! {
            // --- Branch 1: forward bus messages to the client ---
            event = rx.recv() => {
                match event {
                    Ok(message) => {
                        match serde_json::to_string(&message) {
                            Ok(json) => {
                                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                                    // Client disconnected
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(%session_id, "Failed to serialize message: {err}");
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            %session_id,
                            skipped = n,
                            "WebSocket subscriber lagged, skipping {n} messages"
                        );
                        // Keep receiving; the client recovers via polling.
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }

            // --- Branch 2: watch for the client going away ---
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%session_id, "WebSocket receive error: {err}");
                        break;
                    }
                    // No client commands expected; ignore everything else.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!(%session_id, "WebSocket connection closed");
}
