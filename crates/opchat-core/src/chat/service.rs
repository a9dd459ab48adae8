//! Chat service orchestrating the session store, message log, and fanout.
//!
//! `ChatService` validates input, keeps append order aligned with assigned
//! positions, and publishes every stored message to the session bus.
//! Generic over `ChatRepository` to maintain clean architecture
//! (opchat-core never depends on opchat-infra).

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, broadcast};
use tracing::debug;
use uuid::Uuid;

use opchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use opchat_types::error::ChatError;

use crate::chat::bus::SessionBus;
use crate::chat::repository::ChatRepository;

/// Orchestrates session lifecycle, message appends, and broadcast fanout.
pub struct ChatService<R: ChatRepository> {
    repo: R,
    bus: SessionBus,
    /// Per-session append locks. The repository already assigns positions
    /// atomically; this lock additionally keeps bus publish order aligned
    /// with those positions. Never held across channel I/O.
    append_locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<R: ChatRepository> ChatService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            bus: SessionBus::new(),
            append_locks: DashMap::new(),
        }
    }

    /// Access the repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Access the session bus.
    pub fn bus(&self) -> &SessionBus {
        &self.bus
    }

    // --- Session store ---

    /// Create a new session.
    ///
    /// Always succeeds; the identifier is a fresh UUIDv7. An empty or
    /// whitespace-only `user_id` is normalized to none.
    pub async fn create_session(
        &self,
        user_id: Option<String>,
    ) -> Result<ChatSession, ChatError> {
        let session = ChatSession {
            id: Uuid::now_v7(),
            user_id: normalize_user_id(user_id),
            created_at: Utc::now(),
        };

        let created = self.repo.create_session(&session).await?;
        debug!(session_id = %created.id, "session created");
        Ok(created)
    }

    /// Get a session by ID.
    pub async fn get_session(&self, session_id: &Uuid) -> Result<ChatSession, ChatError> {
        self.repo
            .get_session(session_id)
            .await?
            .ok_or(ChatError::SessionNotFound)
    }

    /// Backfill the session's user identifier, first-write-wins.
    ///
    /// A second call with the same or a different value leaves the stored
    /// identifier untouched and returns the session unchanged. An empty
    /// `user_id` is a no-op lookup.
    pub async fn attach_user_id(
        &self,
        session_id: &Uuid,
        user_id: &str,
    ) -> Result<ChatSession, ChatError> {
        if user_id.trim().is_empty() {
            return self.get_session(session_id).await;
        }

        self.repo
            .attach_user_id(session_id, user_id.trim())
            .await?
            .ok_or(ChatError::SessionNotFound)
    }

    /// Most recent session carrying the given user identifier.
    pub async fn latest_session_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<ChatSession>, ChatError> {
        Ok(self.repo.latest_session_for_user(user_id).await?)
    }

    // --- Message log ---

    /// Append a message to a session and fan it out to live subscribers.
    ///
    /// Rejects empty/whitespace content and unknown sessions. The stored
    /// content is the trimmed text.
    pub async fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::InvalidContent);
        }

        // Surface unknown sessions as NotFound before touching the log.
        self.get_session(session_id).await?;

        let lock = self
            .append_locks
            .entry(*session_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let message = self.repo.append_message(session_id, role, content).await?;
        self.bus.publish(session_id, message.clone());

        debug!(session_id = %session_id, seq = message.seq, role = %role, "message appended");
        Ok(message)
    }

    /// Messages with `seq` strictly greater than `after_seq`, ascending.
    ///
    /// The polling catch-up path; `None` returns the full history. Returns
    /// the same content and order the bus would have delivered for the
    /// same window, so clients can switch freely between the two.
    pub async fn poll(
        &self,
        session_id: &Uuid,
        after_seq: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.get_session(session_id).await?;
        Ok(self.repo.list_messages_since(session_id, after_seq).await?)
    }

    /// Subscribe to live fanout for a session.
    pub async fn subscribe(
        &self,
        session_id: &Uuid,
    ) -> Result<broadcast::Receiver<ChatMessage>, ChatError> {
        self.get_session(session_id).await?;
        Ok(self.bus.subscribe(*session_id))
    }

    // --- Stats ---

    pub async fn count_sessions(&self) -> Result<u64, ChatError> {
        Ok(self.repo.count_sessions().await?)
    }

    pub async fn count_messages(&self) -> Result<u64, ChatError> {
        Ok(self.repo.count_messages().await?)
    }
}

fn normalize_user_id(user_id: Option<String>) -> Option<String> {
    user_id
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryChatRepository;

    fn service() -> Arc<ChatService<MemoryChatRepository>> {
        Arc::new(ChatService::new(MemoryChatRepository::new()))
    }

    #[tokio::test]
    async fn create_and_get_session() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();
        let found = svc.get_session(&session.id).await.unwrap();
        assert_eq!(found.id, session.id);
        assert!(found.user_id.is_none());
    }

    #[tokio::test]
    async fn create_session_normalizes_empty_user_id() {
        let svc = service();
        let session = svc.create_session(Some("   ".to_string())).await.unwrap();
        assert!(session.user_id.is_none());
    }

    #[tokio::test]
    async fn get_unknown_session_is_not_found() {
        let svc = service();
        let result = svc.get_session(&Uuid::now_v7()).await;
        assert!(matches!(result, Err(ChatError::SessionNotFound)));
    }

    #[tokio::test]
    async fn attach_user_id_is_first_write_wins() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();

        let s1 = svc.attach_user_id(&session.id, "u1").await.unwrap();
        assert_eq!(s1.user_id.as_deref(), Some("u1"));

        // Same value again: unchanged.
        let s2 = svc.attach_user_id(&session.id, "u1").await.unwrap();
        assert_eq!(s2.user_id.as_deref(), Some("u1"));

        // Different value: still unchanged.
        let s3 = svc.attach_user_id(&session.id, "u2").await.unwrap();
        assert_eq!(s3.user_id.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn append_assigns_sequential_positions() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();

        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            let msg = svc
                .append_message(&session.id, MessageRole::User, text)
                .await
                .unwrap();
            assert_eq!(msg.seq, i as i64 + 1);
        }

        let history = svc.poll(&session.id, None).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn append_rejects_empty_content() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();
        let result = svc
            .append_message(&session.id, MessageRole::User, "   \n\t ")
            .await;
        assert!(matches!(result, Err(ChatError::InvalidContent)));
    }

    #[tokio::test]
    async fn append_to_unknown_session_is_not_found() {
        let svc = service();
        let result = svc
            .append_message(&Uuid::now_v7(), MessageRole::User, "hello")
            .await;
        assert!(matches!(result, Err(ChatError::SessionNotFound)));
    }

    #[tokio::test]
    async fn append_stores_trimmed_content() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();
        let msg = svc
            .append_message(&session.id, MessageRole::User, "  Salom  ")
            .await
            .unwrap();
        assert_eq!(msg.content, "Salom");
    }

    #[tokio::test]
    async fn poll_with_cursor_returns_strictly_newer() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();

        let mut seqs = Vec::new();
        for text in ["a", "b", "c", "d"] {
            let msg = svc
                .append_message(&session.id, MessageRole::User, text)
                .await
                .unwrap();
            seqs.push(msg.seq);
        }

        let after_second = svc.poll(&session.id, Some(seqs[1])).await.unwrap();
        let contents: Vec<&str> = after_second.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["c", "d"]);

        let after_last = svc.poll(&session.id, Some(seqs[3])).await.unwrap();
        assert!(after_last.is_empty());
    }

    #[tokio::test]
    async fn append_publishes_to_subscribers() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();
        let mut rx = svc.subscribe(&session.id).await.unwrap();

        svc.append_message(&session.id, MessageRole::Operator, "reply")
            .await
            .unwrap();

        let got = rx.recv().await.unwrap();
        assert_eq!(got.content, "reply");
        assert_eq!(got.role, MessageRole::Operator);
    }

    #[tokio::test]
    async fn concurrent_appends_get_distinct_positions() {
        let svc = service();
        let session = svc.create_session(None).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let svc = Arc::clone(&svc);
            let session_id = session.id;
            handles.push(tokio::spawn(async move {
                svc.append_message(&session_id, MessageRole::User, &format!("msg {i}"))
                    .await
                    .unwrap()
                    .seq
            }));
        }

        let mut seqs = Vec::new();
        for handle in handles {
            seqs.push(handle.await.unwrap());
        }
        seqs.sort_unstable();

        // No lost messages, no duplicate positions: exactly 1..=32.
        assert_eq!(seqs, (1..=32).collect::<Vec<i64>>());

        let history = svc.poll(&session.id, None).await.unwrap();
        assert_eq!(history.len(), 32);
    }

    #[tokio::test]
    async fn sessions_append_independently() {
        let svc = service();
        let a = svc.create_session(None).await.unwrap();
        let b = svc.create_session(None).await.unwrap();

        svc.append_message(&a.id, MessageRole::User, "in a")
            .await
            .unwrap();
        let msg_b = svc
            .append_message(&b.id, MessageRole::User, "in b")
            .await
            .unwrap();

        // Positions are per-session, not global.
        assert_eq!(msg_b.seq, 1);

        let history_a = svc.poll(&a.id, None).await.unwrap();
        assert_eq!(history_a.len(), 1);
        assert_eq!(history_a[0].content, "in a");
    }
}
