//! In-memory test doubles shared by the unit tests in this crate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::Utc;
use uuid::Uuid;

use opchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use opchat_types::error::{ChannelError, RepositoryError};

use crate::chat::repository::ChatRepository;
use crate::relay::channel::OperatorChannel;

/// HashMap-backed `ChatRepository` for tests.
pub(crate) struct MemoryChatRepository {
    sessions: Mutex<HashMap<Uuid, ChatSession>>,
    messages: Mutex<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl MemoryChatRepository {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            messages: Mutex::new(HashMap::new()),
        }
    }
}

impl ChatRepository for MemoryChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn attach_user_id(
        &self,
        session_id: &Uuid,
        user_id: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(session_id) {
            None => Ok(None),
            Some(session) => {
                if session.user_id.is_none() {
                    session.user_id = Some(user_id.to_string());
                }
                Ok(Some(session.clone()))
            }
        }
    }

    async fn latest_session_for_user(
        &self,
        user_id: &str,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id.as_deref() == Some(user_id))
            .max_by_key(|s| (s.created_at, s.id))
            .cloned())
    }

    async fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        if !self.sessions.lock().unwrap().contains_key(session_id) {
            return Err(RepositoryError::NotFound);
        }

        let mut messages = self.messages.lock().unwrap();
        let log = messages.entry(*session_id).or_default();
        let message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: *session_id,
            seq: log.last().map(|m| m.seq).unwrap_or(0) + 1,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        log.push(message.clone());
        Ok(message)
    }

    async fn list_messages_since(
        &self,
        session_id: &Uuid,
        after_seq: Option<i64>,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let cursor = after_seq.unwrap_or(0);
        Ok(self
            .messages
            .lock()
            .unwrap()
            .get(session_id)
            .map(|log| {
                log.iter()
                    .filter(|m| m.seq > cursor)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default())
    }

    async fn count_sessions(&self) -> Result<u64, RepositoryError> {
        Ok(self.sessions.lock().unwrap().len() as u64)
    }

    async fn count_messages(&self) -> Result<u64, RepositoryError> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .values()
            .map(|log| log.len() as u64)
            .sum())
    }
}

/// Recording `OperatorChannel` for tests.
pub(crate) struct MockChannel {
    pub(crate) operator_sent: Mutex<Vec<String>>,
    pub(crate) user_sent: Mutex<Vec<(String, String)>>,
    next_message_id: AtomicI64,
    pub(crate) fail_sends: AtomicBool,
}

impl MockChannel {
    pub(crate) fn new() -> Self {
        Self {
            operator_sent: Mutex::new(Vec::new()),
            user_sent: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(1),
            fail_sends: AtomicBool::new(false),
        }
    }

    /// Wait until `count` operator sends have landed (notify runs on a
    /// detached task), panicking after a short deadline.
    pub(crate) async fn wait_for_operator_sends(&self, count: usize) -> Vec<String> {
        for _ in 0..200 {
            {
                let sent = self.operator_sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!(
            "expected {count} operator sends, got {}",
            self.operator_sent.lock().unwrap().len()
        );
    }
}

impl OperatorChannel for MockChannel {
    async fn send_to_operator(&self, text: &str) -> Result<Option<i64>, ChannelError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::Timeout);
        }
        self.operator_sent.lock().unwrap().push(text.to_string());
        Ok(Some(self.next_message_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn send_to_user(&self, user_id: &str, text: &str) -> Result<(), ChannelError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::Timeout);
        }
        self.user_sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), text.to_string()));
        Ok(())
    }
}
