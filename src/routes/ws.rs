//! WebSocket handler — relays between one socket and the hub.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers a bounded outbound queue
//! with the hub, and enters a `select!` loop:
//! - Incoming client frames → hand to the hub (malformed ones are logged)
//! - Encoded snapshots queued by the hub → write to the socket
//! - Heartbeat ticks → ping, and give up on peers that went silent
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade (frames above `max_message_bytes` are refused) → hub
//!    registers the client and queues the current history
//! 2. Client sends `{"text": ...}` → hub appends and broadcasts
//! 3. Close, socket error, stale heartbeat, or hub dropping the queue
//!    → deregister → task ends

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::hub::HubError;
use crate::state::AppState;

/// Silent intervals tolerated before a peer is considered gone.
const MAX_MISSED_HEARTBEATS: u32 = 2;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    upgrade(ws, state)
}

pub(super) fn upgrade(ws: WebSocketUpgrade, state: AppState) -> Response {
    let limit = state.config.max_message_bytes;
    ws.max_frame_size(limit)
        .max_message_size(limit)
        .on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection queue the hub pushes encoded snapshots into.
    let (client_tx, mut client_rx) = mpsc::channel::<Utf8Bytes>(state.config.client_queue_capacity);

    if state.hub.connect(client_id, client_tx).await.is_err() {
        warn!(%client_id, "ws: hub unavailable, closing");
        let _ = socket.send(Message::Close(None)).await;
        return;
    }

    info!(%client_id, "ws: client connected");

    let mut heartbeat = Heartbeat::new(state.config.ping_interval);

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                heartbeat.record_activity();
                let result = match msg {
                    Message::Text(text) => handle_inbound(&state, client_id, text.as_str().as_bytes()).await,
                    Message::Binary(bytes) => handle_inbound(&state, client_id, &bytes).await,
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => Ok(()),
                };
                if result.is_err() {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
            payload = client_rx.recv() => {
                // The hub dropped our queue: slow consumer or shutdown.
                let Some(payload) = payload else {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                };
                if send_payload(&mut socket, client_id, payload).await.is_err() {
                    break;
                }
            }
            () = heartbeat.tick() => {
                if !heartbeat.peer_alive() {
                    warn!(%client_id, "ws: heartbeat timeout");
                    break;
                }
                if socket.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.hub.disconnect(client_id).await;
    info!(%client_id, "ws: client disconnected");
}

/// Forward one inbound frame body to the hub. Malformed payloads are logged
/// and dropped; only a stopped hub is returned as an error.
async fn handle_inbound(state: &AppState, client_id: Uuid, raw: &[u8]) -> Result<(), HubError> {
    match state.hub.message(client_id, raw).await {
        Ok(()) => Ok(()),
        Err(HubError::MalformedPayload(e)) => {
            warn!(%client_id, error = %e, "ws: invalid inbound message");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn send_payload(socket: &mut WebSocket, client_id: Uuid, payload: Utf8Bytes) -> Result<(), ()> {
    debug!(%client_id, bytes = payload.as_str().len(), "ws: send snapshot");
    socket.send(Message::Text(payload)).await.map_err(|e| {
        debug!(%client_id, error = %e, "ws: send failed");
    })
}

// =============================================================================
// HEARTBEAT
// =============================================================================

/// Ping schedule plus a count of intervals with no inbound traffic.
struct Heartbeat {
    interval: Option<Interval>,
    active: bool,
    missed: u32,
}

impl Heartbeat {
    fn new(period: Option<Duration>) -> Self {
        let interval = period.map(|period| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        Self { interval, active: false, missed: 0 }
    }

    fn record_activity(&mut self) {
        self.active = true;
    }

    /// Resolves on the next tick; never resolves when heartbeats are disabled.
    async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Close out the interval that just ended.
    fn peer_alive(&mut self) -> bool {
        if self.active {
            self.missed = 0;
        } else {
            self.missed += 1;
        }
        self.active = false;
        self.missed < MAX_MISSED_HEARTBEATS
    }
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
