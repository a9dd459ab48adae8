//! Bounded map from outbound channel message id to session id.
//!
//! When a notification is delivered, the channel's message id for it is
//! remembered here so an operator reply that references the message
//! directly can be routed without parsing any text. The cache is capped:
//! the oldest entries are evicted first, and a reply to an evicted
//! notification falls back to the text-marker path.

use std::collections::VecDeque;
use std::sync::Mutex;

use uuid::Uuid;

/// Default capacity: plenty for a single operator's working set.
pub const DEFAULT_REPLY_CACHE_CAPACITY: usize = 1024;

/// Capacity-bounded FIFO cache of message id -> session id.
pub struct ReplyCache {
    entries: Mutex<VecDeque<(i64, Uuid)>>,
    capacity: usize,
}

impl ReplyCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity: capacity.max(1),
        }
    }

    /// Record an outbound message id for a session, evicting the oldest
    /// entry when at capacity.
    pub fn record(&self, message_id: i64, session_id: Uuid) {
        let mut entries = self.entries.lock().expect("reply cache poisoned");
        if let Some(pos) = entries.iter().position(|(id, _)| *id == message_id) {
            entries.remove(pos);
        }
        while entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back((message_id, session_id));
    }

    /// Look up the session a message id was sent for.
    pub fn lookup(&self, message_id: i64) -> Option<Uuid> {
        self.entries
            .lock()
            .expect("reply cache poisoned")
            .iter()
            .find(|(id, _)| *id == message_id)
            .map(|(_, session_id)| *session_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("reply cache poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ReplyCache {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_CACHE_CAPACITY)
    }
}
