//! History store — bounded, order-preserving message log.
//!
//! DESIGN
//! ======
//! A `VecDeque<Arc<str>>` capped at `HISTORY_CAPACITY`. Appends push to the
//! back and evict from the front, so iteration order is display order
//! (oldest first). Snapshots are owned vectors that share the message text
//! with the store; nothing outside the hub ever sees the live deque.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::error;

use crate::protocol::Snapshot;

/// Maximum number of messages retained.
pub const HISTORY_CAPACITY: usize = 50;

#[derive(Debug)]
pub struct History {
    messages: VecDeque<Arc<str>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self { messages: VecDeque::with_capacity(HISTORY_CAPACITY + 1) }
    }

    /// Append `text` as the newest message, evicting the oldest when full.
    pub fn append(&mut self, text: String) {
        self.messages.push_back(Arc::from(text));
        if self.messages.len() > HISTORY_CAPACITY {
            self.messages.pop_front();
        }
        self.check_capacity();
    }

    /// Copy of the current history, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot { messages: self.messages.iter().cloned().collect() }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    fn check_capacity(&mut self) {
        debug_assert!(
            self.messages.len() <= HISTORY_CAPACITY,
            "history exceeded capacity: {} > {HISTORY_CAPACITY}",
            self.messages.len()
        );
        if self.messages.len() > HISTORY_CAPACITY {
            error!(len = self.messages.len(), capacity = HISTORY_CAPACITY, "history: capacity violated, trimming");
            let excess = self.messages.len() - HISTORY_CAPACITY;
            self.messages.drain(..excess);
        }
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
