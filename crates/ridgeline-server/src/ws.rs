//! WebSocket push of reader events.
//!
//! Each connected client gets its own event bus subscription and receives
//! every `identify` / `user-add` / `user-update` / `user-delete` notification
//! as one JSON text frame. Delivery is broadcast with no acknowledgement; a
//! client that cannot keep up skips the events it missed.

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::http::AppState;

/// `GET /ws` upgrade handler.
pub async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| push_events(socket, state))
}

async fn push_events(mut socket: WebSocket, state: AppState) {
    let mut events = state.registry.subscribe();
    debug!("websocket client connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(err) => {
                            warn!(%err, "event serialization failed");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "slow websocket client skipped events");
                }
                Err(RecvError::Closed) => break,
            },
            // Drain client frames so pings are answered and closes observed
            incoming = socket.recv() => {
                if !matches!(incoming, Some(Ok(_))) {
                    break;
                }
            }
        }
    }

    debug!("websocket client disconnected");
}
