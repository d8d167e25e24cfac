//! Hub service — connection registry, message ingestion, and fan-out.
//!
//! DESIGN
//! ======
//! The hub is a single tokio task that exclusively owns the `History` and
//! the client set. Connection tasks talk to it through a cloneable
//! `HubHandle` that enqueues `HubCommand`s on one mpsc queue, so connect,
//! append+broadcast, and disconnect are applied one at a time in arrival
//! order. Every client sees the same snapshot for a given round.
//!
//! BACKPRESSURE
//! ============
//! Each client owns a bounded outbound queue. The hub delivers with
//! `try_send` and never awaits a client: a full or closed queue gets the
//! client deregistered on the spot. Dropping the sender ends that client's
//! connection task, which closes the socket.
//!
//! Each snapshot is encoded to JSON once per round; client queues hold
//! clones of the same `Utf8Bytes` buffer.

use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::history::History;
use crate::protocol::InboundMessage;

// =============================================================================
// TYPES
// =============================================================================

/// Outbound queue for one connected client. Items are encoded snapshots.
pub type ClientSender = mpsc::Sender<Utf8Bytes>;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
    #[error("hub is closed")]
    Closed,
}

/// Point-in-time counters, used for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    pub clients: usize,
    pub messages: usize,
}

enum HubCommand {
    Connect { client_id: Uuid, tx: ClientSender },
    Message { client_id: Uuid, text: String },
    Disconnect { client_id: Uuid },
    Stats { reply: oneshot::Sender<HubStats> },
    Shutdown { done: oneshot::Sender<()> },
}

// =============================================================================
// HUB STATE
// =============================================================================

/// State owned by the hub task. Only reachable through `HubCommand`s.
pub struct Hub {
    history: History,
    clients: HashMap<Uuid, ClientSender>,
}

impl Hub {
    #[must_use]
    pub fn new() -> Self {
        Self { history: History::new(), clients: HashMap::new() }
    }

    /// Register a client and queue the current snapshot to it.
    pub fn on_connect(&mut self, client_id: Uuid, tx: ClientSender) {
        let Some(payload) = self.encode_snapshot() else {
            return;
        };
        match tx.try_send(payload) {
            Ok(()) => {
                self.clients.insert(client_id, tx);
                info!(%client_id, clients = self.clients.len(), "hub: client registered");
            }
            Err(e) => {
                warn!(%client_id, reason = send_failure(&e), "hub: initial snapshot failed, client dropped");
            }
        }
    }

    /// Append `text` and push the new snapshot to every registered client,
    /// the sender included.
    pub fn on_message(&mut self, client_id: Uuid, text: String) {
        self.history.append(text);
        debug!(%client_id, messages = self.history.len(), "hub: message appended");
        if let Some(payload) = self.encode_snapshot() {
            self.broadcast(&payload);
        }
    }

    /// Deregister a client. Absent clients are ignored.
    pub fn on_disconnect(&mut self, client_id: Uuid) {
        if self.clients.remove(&client_id).is_some() {
            info!(%client_id, clients = self.clients.len(), "hub: client deregistered");
        }
    }

    #[must_use]
    pub fn stats(&self) -> HubStats {
        HubStats { clients: self.clients.len(), messages: self.history.len() }
    }

    #[cfg(test)]
    fn is_registered(&self, client_id: Uuid) -> bool {
        self.clients.contains_key(&client_id)
    }

    fn encode_snapshot(&self) -> Option<Utf8Bytes> {
        match self.history.snapshot().encode() {
            Ok(payload) => Some(payload),
            Err(e) => {
                error!(error = %e, "hub: failed to encode snapshot");
                None
            }
        }
    }

    fn broadcast(&mut self, payload: &Utf8Bytes) {
        let mut failed = Vec::new();
        for (client_id, tx) in &self.clients {
            if let Err(e) = tx.try_send(payload.clone()) {
                failed.push((*client_id, send_failure(&e)));
            }
        }

        for (client_id, reason) in failed {
            self.clients.remove(&client_id);
            warn!(%client_id, reason, clients = self.clients.len(), "hub: delivery failed, client dropped");
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<HubCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                HubCommand::Connect { client_id, tx } => self.on_connect(client_id, tx),
                HubCommand::Message { client_id, text } => self.on_message(client_id, text),
                HubCommand::Disconnect { client_id } => self.on_disconnect(client_id),
                HubCommand::Stats { reply } => {
                    let _ = reply.send(self.stats());
                }
                HubCommand::Shutdown { done } => {
                    info!(clients = self.clients.len(), messages = self.history.len(), "hub: shutting down");
                    self.clients.clear();
                    let _ = done.send(());
                    return;
                }
            }
        }
        info!("hub: all handles dropped, stopping");
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

fn send_failure<T>(e: &TrySendError<T>) -> &'static str {
    match e {
        TrySendError::Full(_) => "queue full",
        TrySendError::Closed(_) => "closed",
    }
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable front door to the hub task.
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Spawn the hub task. Returns the handle and the task's join handle.
    #[must_use]
    pub fn spawn(queue_capacity: usize) -> (Self, JoinHandle<()>) {
        let (commands, rx) = mpsc::channel(queue_capacity);
        let task = tokio::spawn(Hub::new().run(rx));
        (Self { commands }, task)
    }

    /// Register `client_id`; its first queued item is the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has shut down.
    pub async fn connect(&self, client_id: Uuid, tx: ClientSender) -> Result<(), HubError> {
        self.send(HubCommand::Connect { client_id, tx }).await
    }

    /// Parse a raw inbound frame and, if valid, append and broadcast it.
    ///
    /// # Errors
    ///
    /// Returns `HubError::MalformedPayload` if `raw` is not `{"text": string}`,
    /// or `HubError::Closed` if the hub has shut down.
    pub async fn message(&self, client_id: Uuid, raw: &[u8]) -> Result<(), HubError> {
        let InboundMessage { text } = InboundMessage::parse(raw)?;
        self.send(HubCommand::Message { client_id, text }).await
    }

    /// Deregister `client_id`. A no-op for unknown clients or a stopped hub.
    pub async fn disconnect(&self, client_id: Uuid) {
        let _ = self.send(HubCommand::Disconnect { client_id }).await;
    }

    /// # Errors
    ///
    /// Returns `HubError::Closed` if the hub has shut down.
    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| HubError::Closed)
    }

    /// Drop every client queue and stop the hub task. Waits for the hub to
    /// acknowledge; returns immediately if it is already gone.
    pub async fn shutdown(&self) {
        let (done, rx) = oneshot::channel();
        if self.send(HubCommand::Shutdown { done }).await.is_ok() {
            let _ = rx.await;
        }
    }

    async fn send(&self, command: HubCommand) -> Result<(), HubError> {
        self.commands.send(command).await.map_err(|_| HubError::Closed)
    }
}

#[cfg(test)]
#[path = "hub_test.rs"]
mod tests;
