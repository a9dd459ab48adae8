//! Chat session and message types for opchat.
//!
//! A session is one anonymous web visitor's conversation with the operator.
//! Messages form an append-only, per-session ordered log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who produced a chat message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'operator'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The web visitor.
    User,
    /// The human operator replying through the external channel.
    Operator,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Operator => write!(f, "operator"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "operator" => Ok(MessageRole::Operator),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// An addressable conversation between one anonymous web visitor and the
/// operator.
///
/// The id is opaque and globally unique (UUIDv7, assigned at creation).
/// `user_id` is a caller-supplied identifier, set at most once
/// (first-write-wins). Sessions are never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single message within a chat session.
///
/// `seq` is strictly increasing within its session and is the stable
/// cursor for polling catch-up. Messages are append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub seq: i64,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::User, MessageRole::Operator] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let json = serde_json::to_string(&MessageRole::Operator).unwrap();
        assert_eq!(json, "\"operator\"");
        let parsed: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MessageRole::Operator);
    }

    #[test]
    fn test_invalid_role_rejected() {
        assert!("admin".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_chat_message_serialize() {
        let msg = ChatMessage {
            id: Uuid::now_v7(),
            session_id: Uuid::now_v7(),
            seq: 3,
            role: MessageRole::User,
            content: "Salom".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"seq\":3"));
        assert!(json.contains("\"role\":\"user\""));
    }

    #[test]
    fn test_chat_session_serialize_without_user_id() {
        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"user_id\":null"));
    }
}
