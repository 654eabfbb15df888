//! WebSocket handler: init handshake, bus event streaming and player input.
//!
//! Protocol:
//!   1. Client sends:  `{ "type": "start", "name": "Village Screen" }`
//!   2. Server sends:  `{ "type": "init", "source_id": "ws.abc123", "frame": { ... }, "decorations": [ ... ] }`
//!   3. Server streams `GarlandMessage` events; the client sends
//!      `PlayerCommand` objects (`{ "type": "begin_throw", "zone_id": "..." }`)

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::{WebState, emit_telemetry};
use crate::state::config;
use garland::{GarlandMessage, PlayerCommand};

/// GET /api/ws: upgrade to WebSocket.
pub async fn ws_upgrade(
    State(state): State<Arc<WebState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn handle_ws(socket: WebSocket, state: Arc<WebState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Phase 1: wait for "start" from the client
    let client_name = loop {
        match ws_rx.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Some(name) = parse_start_message(&text) {
                    break name;
                }
            }
            Some(Ok(Message::Close(_))) | None => return,
            _ => continue,
        }
    };

    // Phase 2: "init" with the source id and the current game view
    let source_id = format!("ws.{}", config::generate_id());
    state.ws_count.fetch_add(1, Ordering::Relaxed);
    emit_telemetry(&state, &state.bus_tx);
    tracing::info!("ws: client '{client_name}' connected (source_id={source_id})");

    let init_msg = serde_json::json!({
        "type": "init",
        "source_id": source_id,
        "frame": state.root.game.frame(),
        "decorations": state.root.game.decorations(),
    });
    if ws_tx
        .send(Message::text(init_msg.to_string()))
        .await
        .is_err()
    {
        state.ws_count.fetch_sub(1, Ordering::Relaxed);
        return;
    }

    // Phase 3: stream bus events and accept commands
    let mut bus_rx = state.bus_tx.subscribe();

    let mut send_task = tokio::spawn(async move {
        loop {
            match bus_rx.recv().await {
                Ok(msg) => {
                    if let Ok(json) = serde_json::to_string(&msg)
                        && ws_tx.send(Message::text(json)).await.is_err()
                    {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("ws: lagged {n}");
                }
            }
        }
    });

    let ws_source = source_id.clone();
    let bus_tx = state.bus_tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_rx.next().await {
            match msg {
                Message::Text(text) => handle_ws_command(&text, &ws_source, &bus_tx),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.ws_count.fetch_sub(1, Ordering::Relaxed);
    emit_telemetry(&state, &state.bus_tx);
    tracing::info!("ws: client '{client_name}' disconnected (source_id={source_id})");
}

/// Parse a "start" handshake message. Returns the client name if valid.
fn parse_start_message(text: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct StartMsg {
        #[serde(rename = "type")]
        msg_type: String,
        #[serde(default)]
        name: String,
    }
    let msg: StartMsg = serde_json::from_str(text).ok()?;
    if msg.msg_type == "start" {
        Some(if msg.name.is_empty() {
            "anonymous".to_string()
        } else {
            msg.name
        })
    } else {
        None
    }
}

/// Parse a player command and put it on the bus under the socket's source id.
/// Anything else is logged and dropped.
fn handle_ws_command(text: &str, source: &str, bus_tx: &broadcast::Sender<GarlandMessage>) {
    match serde_json::from_str::<PlayerCommand>(text) {
        Ok(cmd) => {
            let _ = bus_tx.send(GarlandMessage::new(cmd).source(source));
        }
        Err(e) => tracing::debug!("ws: ignoring message from {source}: {e}"),
    }
}
