//! Session-keyed broadcast bus for fanning out newly appended messages.
//!
//! Built on `tokio::sync::broadcast` with one channel per session id.
//! Delivery is at-most-once and best-effort: durability is the message
//! log's job, this layer only gives connected clients low latency.

use dashmap::DashMap;
use opchat_types::chat::ChatMessage;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Per-subscriber buffer size. A receiver that falls further behind than
/// this loses the oldest buffered messages (broadcast lag) instead of
/// stalling the publisher; a poll with its last-seen `seq` recovers them.
const SESSION_BUFFER: usize = 256;

/// Multi-consumer fanout keyed by session id.
///
/// Cloning the bus is cheap; all clones share the same channel map.
#[derive(Clone)]
pub struct SessionBus {
    channels: std::sync::Arc<DashMap<Uuid, broadcast::Sender<ChatMessage>>>,
}

impl SessionBus {
    pub fn new() -> Self {
        Self {
            channels: std::sync::Arc::new(DashMap::new()),
        }
    }

    /// Create a new subscriber for a session.
    ///
    /// The channel is created on first subscribe. The receiver gets every
    /// message published after this call, until it is dropped.
    pub fn subscribe(&self, session_id: Uuid) -> broadcast::Receiver<ChatMessage> {
        let entry = self.channels.entry(session_id).or_insert_with(|| {
            let (tx, _) = broadcast::channel(SESSION_BUFFER);
            tx
        });
        entry.subscribe()
    }

    /// Publish a message to all current subscribers of its session.
    ///
    /// Returns the number of receivers the message was delivered to. With
    /// no subscribers the message is silently dropped, and a channel whose
    /// last receiver is gone is removed so the map does not grow without
    /// bound across many short-lived sessions.
    pub fn publish(&self, session_id: &Uuid, message: ChatMessage) -> usize {
        let delivered = match self.channels.get(session_id) {
            Some(tx) => tx.send(message).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            // remove_if locks the shard, so a concurrent subscribe() cannot
            // slip in between the count check and the removal.
            self.channels
                .remove_if(session_id, |_, tx| tx.receiver_count() == 0);
        }

        delivered
    }

    /// Number of live subscribers for a session.
    pub fn subscriber_count(&self, session_id: &Uuid) -> usize {
        self.channels
            .get(session_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBus")
            .field("sessions", &self.channels.len())
            .finish()
    }
}
