//! Operator-channel event and relay outcome types.
//!
//! The operator channel is opaque to the core: inbound traffic arrives as
//! [`OperatorEvent`] values regardless of which messenger backs it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::ChatMessage;

/// An inbound event from the operator channel.
///
/// `sender` is the channel-level identity of whoever wrote the message;
/// whether it is the designated operator is decided by the relay adapter.
/// `replied_to_*` carry the channel's "replying to" relationship when the
/// sender used it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEvent {
    pub sender: String,
    pub text: String,
    pub replied_to_text: Option<String>,
    pub replied_to_message_id: Option<i64>,
}

/// The outcome of ingesting one operator-channel event.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The event came from the operator and was routed to a session
    /// (appended + fanned out), to a user's own channel address, or both.
    OperatorReply {
        session_id: Option<Uuid>,
        direct_user: Option<String>,
        message: Option<ChatMessage>,
    },
    /// The event came from an ordinary channel user: answered automatically
    /// and forwarded to the operator with correlation metadata.
    VisitorMessage { sender: String },
}
