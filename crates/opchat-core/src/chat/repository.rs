//! ChatRepository trait definition.
//!
//! Persistence port for chat sessions and the append-only message log.
//! The implementation is the sole writer of messages and owns position
//! assignment.

use opchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use opchat_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for session and message persistence.
///
/// Implementations live in opchat-infra (e.g., `SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Persist a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Set the session's user identifier if it is currently unset.
    ///
    /// First-write-wins: a later call with any value leaves the stored
    /// identifier untouched. Returns the stored session, or `None` when
    /// the session does not exist.
    fn attach_user_id(
        &self,
        session_id: &Uuid,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Most recent session carrying the given user identifier, if any.
    fn latest_session_for_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Append a message to a session's log.
    ///
    /// Assigns the next strictly increasing `seq` for that session; the
    /// insert and the position assignment are atomic with respect to
    /// concurrent appends on the same session. Returns the stored message.
    fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// Messages with `seq` strictly greater than `after_seq`, ascending.
    ///
    /// `None` returns the full history.
    fn list_messages_since(
        &self,
        session_id: &Uuid,
        after_seq: Option<i64>,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Count total sessions.
    fn count_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Count total messages across all sessions.
    fn count_messages(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
