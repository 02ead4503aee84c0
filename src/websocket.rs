//! WebSocket handler for real-time monitor updates
//!
//! Streams monitor events to connected clients as they happen. Events are
//! produced by a callback registered on the monitor at startup, fanned out
//! through a broadcast channel; each connection starts with a full summary
//! snapshot so clients don't need a separate initial poll.

use crate::api::AppContext;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// WebSocket upgrade handler
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<Arc<AppContext>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx))
}

// Handle one WebSocket connection
async fn handle_socket(socket: WebSocket, ctx: Arc<AppContext>) {
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket client connected");

    // Send the current state of the ledger as the opening message
    let initial_state = serde_json::json!({
        "event": "initial_state",
        "summary": ctx.monitor.get_overall_summary(),
    });
    if let Err(e) = sender.send(Message::Text(initial_state.to_string())).await {
        error!("Failed to send initial state: {}", e);
        return;
    }

    let mut events = ctx.events.subscribe();

    // Forward monitor events and keep the connection alive with pings
    let mut send_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(PING_INTERVAL);
        ping.tick().await; // the first tick fires immediately
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(payload) => {
                        if sender.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("WebSocket client lagged, {} events dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = ping.tick() => {
                    if sender.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Drain incoming frames until the client hangs up
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    info!("WebSocket client disconnected");
                    break;
                }
                Ok(Message::Pong(_)) => {
                    // Client responded to ping
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    // Whichever half finishes first tears the other down
    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {
            send_task.abort();
        }
    }

    info!("WebSocket connection closed");
}
