//! Wire payloads exchanged over the websocket.
//!
//! DESIGN
//! ======
//! Inbound: `{"text": "<string>"}`. Extra fields are ignored; a missing or
//! non-string `text` is a parse error.
//!
//! Outbound: `{"messages": ["...", ...]}`, oldest first. The same shape is
//! sent on connect and after every accepted message. The hub encodes each
//! snapshot once and every client queue shares the resulting `Utf8Bytes`.

use std::sync::Arc;

use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};

/// A message submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    pub text: String,
}

impl InboundMessage {
    /// Parse a raw frame body (text or binary) as an inbound message.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if `raw` is not an object with a string `text`.
    pub fn parse(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

/// Point-in-time copy of the message history pushed to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub messages: Vec<Arc<str>>,
}

impl Snapshot {
    /// Serialize to the outbound JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn encode(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}

/// Message texts carried by an encoded outbound payload.
#[cfg(test)]
pub fn decode_messages(payload: &str) -> Vec<String> {
    #[derive(Deserialize)]
    struct Outbound {
        messages: Vec<String>,
    }
    serde_json::from_str::<Outbound>(payload)
        .expect("outbound payload should be valid json")
        .messages
}

#[cfg(test)]
#[path = "protocol_test.rs"]
mod tests;
