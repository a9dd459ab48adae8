//! Operator relay adapter: forwards web messages to the operator and
//! ingests inbound channel events.
//!
//! Outbound notification is fire-and-forget on a detached task; failures
//! are logged and never reach the end user's message path. Inbound events
//! are split by sender identity: the designated operator's messages go
//! through reply correlation, everyone else is treated as a channel
//! visitor and answered automatically.

use std::sync::Arc;

use tracing::{debug, info, warn};

use opchat_types::chat::{ChatMessage, ChatSession, MessageRole};
use opchat_types::config::CatalogProduct;
use opchat_types::error::{ChatError, RelayError};
use opchat_types::relay::{IngestOutcome, OperatorEvent};

use crate::answer::answer;
use crate::chat::repository::ChatRepository;
use crate::chat::service::ChatService;
use crate::relay::cache::ReplyCache;
use crate::relay::channel::OperatorChannel;
use crate::relay::correlate::{self, ReplyTarget};

/// Relay between the chat core and the external operator channel.
pub struct OperatorRelay<R: ChatRepository, C: OperatorChannel> {
    chat: Arc<ChatService<R>>,
    channel: Arc<C>,
    /// Channel identity of the designated operator. Events from any other
    /// identity are ordinary end-user traffic.
    operator_identity: String,
    catalog: Vec<CatalogProduct>,
    replies: Arc<ReplyCache>,
}

impl<R: ChatRepository, C: OperatorChannel> OperatorRelay<R, C> {
    pub fn new(
        chat: Arc<ChatService<R>>,
        channel: Arc<C>,
        operator_identity: String,
        catalog: Vec<CatalogProduct>,
    ) -> Self {
        Self {
            chat,
            channel,
            operator_identity,
            catalog,
            replies: Arc::new(ReplyCache::default()),
        }
    }

    /// Forward a web visitor's stored message to the operator.
    ///
    /// Runs on a detached task holding no locks: the triggering append has
    /// already committed, and a failed or timed-out send is logged, never
    /// retried, never surfaced to the visitor. On success the channel's
    /// message id is recorded so a direct reply to the notification can be
    /// correlated without text markers.
    pub fn notify_operator(&self, session: &ChatSession, message: &ChatMessage) {
        let text = correlate::format_web_notification(session, &message.content);
        let channel = Arc::clone(&self.channel);
        let replies = Arc::clone(&self.replies);
        let session_id = session.id;

        tokio::spawn(async move {
            match channel.send_to_operator(&text).await {
                Ok(Some(message_id)) => {
                    replies.record(message_id, session_id);
                    debug!(%session_id, message_id, "operator notified");
                }
                Ok(None) => debug!(%session_id, "operator notified"),
                Err(err) => {
                    warn!(%session_id, error = %err, "operator notification failed");
                }
            }
        });
    }

    /// Handle one inbound event from the operator channel.
    pub async fn ingest(&self, event: OperatorEvent) -> Result<IngestOutcome, RelayError> {
        if event.sender != self.operator_identity {
            return self.handle_visitor(event).await;
        }
        self.handle_operator_reply(event).await
    }

    /// A channel user wrote to the bot directly: answer them automatically
    /// and forward their message to the operator with correlation metadata.
    async fn handle_visitor(&self, event: OperatorEvent) -> Result<IngestOutcome, RelayError> {
        let reply = answer(&event.text, &self.catalog);
        if let Err(err) = self.channel.send_to_user(&event.sender, &reply).await {
            warn!(sender = %event.sender, error = %err, "visitor auto-reply failed");
        }

        let forwarded = correlate::format_visitor_notification(&event.sender, &event.text);
        if let Err(err) = self.channel.send_to_operator(&forwarded).await {
            warn!(sender = %event.sender, error = %err, "visitor forward failed");
        }

        Ok(IngestOutcome::VisitorMessage {
            sender: event.sender,
        })
    }

    /// Route the operator's free-text reply back to a session.
    ///
    /// Correlation priority: the replied-to message id (reply cache), then
    /// markers in the replied-to text, then markers in the reply's own
    /// text. An unresolvable reply gets a diagnostic prompt and appends
    /// nothing.
    async fn handle_operator_reply(
        &self,
        event: OperatorEvent,
    ) -> Result<IngestOutcome, RelayError> {
        let mut target =
            correlate::resolve_target(&event.text, event.replied_to_text.as_deref());

        if let Some(message_id) = event.replied_to_message_id
            && let Some(session_id) = self.replies.lookup(message_id)
        {
            target = ReplyTarget {
                session_id: Some(session_id),
                ..target
            };
        }

        let session = self.resolve_session(&target).await?;

        if session.is_none() && target.user_id.is_none() {
            if let Err(err) = self
                .channel
                .send_to_operator(correlate::unresolved_prompt())
                .await
            {
                warn!(error = %err, "unresolved-reply prompt failed");
            }
            return Err(RelayError::Unresolved);
        }

        let mut appended = None;
        if let Some(session) = &session {
            let message = self
                .chat
                .append_message(&session.id, MessageRole::Operator, &event.text)
                .await
                .map_err(RelayError::Chat)?;
            info!(session_id = %session.id, seq = message.seq, "operator reply routed to session");
            appended = Some(message);
        }

        // Legacy direct path: when the reply names a channel user, deliver
        // to their own address as well.
        let mut direct_user = None;
        if let Some(user_id) = &target.user_id {
            match self.channel.send_to_user(user_id, &event.text).await {
                Ok(()) => direct_user = Some(user_id.clone()),
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "direct reply delivery failed");
                }
            }
        }

        Ok(IngestOutcome::OperatorReply {
            session_id: session.map(|s| s.id),
            direct_user,
            message: appended,
        })
    }

    /// Resolve the target to a live session: by session id when present,
    /// otherwise through the user-id index. An id pointing at no session is
    /// treated as no match, not as a failure.
    async fn resolve_session(
        &self,
        target: &ReplyTarget,
    ) -> Result<Option<ChatSession>, RelayError> {
        if let Some(session_id) = target.session_id {
            match self.chat.get_session(&session_id).await {
                Ok(session) => return Ok(Some(session)),
                Err(ChatError::SessionNotFound) => {
                    debug!(%session_id, "reply names an unknown session");
                }
                Err(err) => return Err(RelayError::Chat(err)),
            }
        }

        if let Some(user_id) = &target.user_id {
            return self
                .chat
                .latest_session_for_user(user_id)
                .await
                .map_err(RelayError::Chat);
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MemoryChatRepository, MockChannel};
    use opchat_types::config::FuelKind;

    fn relay() -> (
        Arc<ChatService<MemoryChatRepository>>,
        Arc<MockChannel>,
        OperatorRelay<MemoryChatRepository, MockChannel>,
    ) {
        let chat = Arc::new(ChatService::new(MemoryChatRepository::new()));
        let channel = Arc::new(MockChannel::new());
        let catalog = vec![CatalogProduct {
            name: "Dizel EURO-5".to_string(),
            kind: FuelKind::Dizel,
        }];
        let relay = OperatorRelay::new(
            Arc::clone(&chat),
            Arc::clone(&channel),
            "777".to_string(),
            catalog,
        );
        (chat, channel, relay)
    }

    fn operator_event(text: &str, replied_to_text: Option<&str>) -> OperatorEvent {
        OperatorEvent {
            sender: "777".to_string(),
            text: text.to_string(),
            replied_to_text: replied_to_text.map(str::to_string),
            replied_to_message_id: None,
        }
    }

    #[tokio::test]
    async fn notify_embeds_session_marker_and_content() {
        let (chat, channel, relay) = relay();
        let session = chat.create_session(None).await.unwrap();
        let message = chat
            .append_message(&session.id, MessageRole::User, "Salom")
            .await
            .unwrap();

        relay.notify_operator(&session, &message);

        let sent = channel.wait_for_operator_sends(1).await;
        assert!(sent[0].contains(&format!("session:{}", session.id)));
        assert!(sent[0].contains("Salom"));
    }

    #[tokio::test]
    async fn notify_failure_is_swallowed() {
        let (chat, channel, relay) = relay();
        channel
            .fail_sends
            .store(true, std::sync::atomic::Ordering::SeqCst);

        let session = chat.create_session(None).await.unwrap();
        let message = chat
            .append_message(&session.id, MessageRole::User, "Salom")
            .await
            .unwrap();

        // Must not panic or surface anywhere; the message is already stored.
        relay.notify_operator(&session, &message);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let history = chat.poll(&session.id, None).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn reply_with_own_text_marker_is_routed() {
        let (chat, _channel, relay) = relay();
        let session = chat.create_session(None).await.unwrap();

        let event = operator_event(&format!("session:{}\nXabaringiz oldi", session.id), None);
        let outcome = relay.ingest(event).await.unwrap();

        match outcome {
            IngestOutcome::OperatorReply {
                session_id,
                message: Some(message),
                ..
            } => {
                assert_eq!(session_id, Some(session.id));
                assert_eq!(message.role, MessageRole::Operator);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn reply_reference_outranks_clean_reply_text() {
        let (chat, _channel, relay) = relay();
        let session = chat.create_session(None).await.unwrap();

        let event = operator_event(
            "Xabaringiz oldi",
            Some(&format!("#web\nsession:{}\nSalom", session.id)),
        );
        let outcome = relay.ingest(event).await.unwrap();

        let history = chat.poll(&session.id, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "Xabaringiz oldi");
        assert!(matches!(
            outcome,
            IngestOutcome::OperatorReply {
                session_id: Some(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cached_message_id_outranks_text_markers() {
        let (chat, channel, relay) = relay();
        let notified = chat.create_session(None).await.unwrap();
        let decoy = chat.create_session(None).await.unwrap();

        let message = chat
            .append_message(&notified.id, MessageRole::User, "Salom")
            .await
            .unwrap();
        relay.notify_operator(&notified, &message);
        channel.wait_for_operator_sends(1).await;

        // Reply references the notification by message id, but its text
        // names a different session.
        let event = OperatorEvent {
            sender: "777".to_string(),
            text: format!("session:{}\nJavob", decoy.id),
            replied_to_text: None,
            replied_to_message_id: Some(1),
        };
        relay.ingest(event).await.unwrap();

        assert_eq!(chat.poll(&notified.id, None).await.unwrap().len(), 2);
        assert_eq!(chat.poll(&decoy.id, None).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn unresolvable_reply_prompts_operator_and_appends_nothing() {
        let (chat, channel, relay) = relay();
        let session = chat.create_session(None).await.unwrap();

        let event = operator_event("Xabaringiz oldi", None);
        let result = relay.ingest(event).await;
        assert!(matches!(result, Err(RelayError::Unresolved)));

        let sent = channel.wait_for_operator_sends(1).await;
        assert!(sent[0].contains("topilmadi"));
        assert!(chat.poll(&session.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn user_id_only_reply_resolves_latest_session_and_direct_path() {
        let (chat, channel, relay) = relay();
        let older = chat.create_session(Some("4242".to_string())).await.unwrap();
        let newer = chat.create_session(Some("4242".to_string())).await.unwrap();

        let event = operator_event("user_id:4242\nJavob", None);
        let outcome = relay.ingest(event).await.unwrap();

        match outcome {
            IngestOutcome::OperatorReply {
                session_id,
                direct_user,
                ..
            } => {
                assert_eq!(session_id, Some(newer.id));
                assert_eq!(direct_user.as_deref(), Some("4242"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        assert!(chat.poll(&older.id, None).await.unwrap().is_empty());
        assert_eq!(chat.poll(&newer.id, None).await.unwrap().len(), 1);
        let direct = channel.user_sent.lock().unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].0, "4242");
    }

    #[tokio::test]
    async fn visitor_message_is_answered_and_forwarded() {
        let (_chat, channel, relay) = relay();

        let event = OperatorEvent {
            sender: "555".to_string(),
            text: "Dizel bormi?".to_string(),
            replied_to_text: None,
            replied_to_message_id: None,
        };
        let outcome = relay.ingest(event).await.unwrap();
        assert!(matches!(outcome, IngestOutcome::VisitorMessage { sender } if sender == "555"));

        // Auto-reply straight back to the visitor.
        let direct = channel.user_sent.lock().unwrap().clone();
        assert_eq!(direct.len(), 1);
        assert_eq!(direct[0].0, "555");
        assert!(direct[0].1.contains("Dizel EURO-5"));

        // Forwarded to the operator with the user marker.
        let forwarded = channel.wait_for_operator_sends(1).await;
        assert!(forwarded[0].starts_with("#user\n"));
        assert!(forwarded[0].contains("user_id:555"));
        assert!(forwarded[0].contains("Dizel bormi?"));
    }

    /// Full round trip: visitor message out, operator reply-by-reference
    /// back in, poll catches up.
    #[tokio::test]
    async fn end_to_end_relay_round_trip() {
        let (chat, channel, relay) = relay();

        let session = chat.create_session(None).await.unwrap();
        let user_msg = chat
            .append_message(&session.id, MessageRole::User, "Salom")
            .await
            .unwrap();
        assert_eq!(user_msg.seq, 1);

        relay.notify_operator(&session, &user_msg);
        let sent = channel.wait_for_operator_sends(1).await;
        assert!(sent[0].contains(&format!("session:{}", session.id)));
        assert!(sent[0].contains("Salom"));

        let event = OperatorEvent {
            sender: "777".to_string(),
            text: "Xabaringiz oldi".to_string(),
            replied_to_text: Some(sent[0].clone()),
            replied_to_message_id: None,
        };
        relay.ingest(event).await.unwrap();

        let caught_up = chat.poll(&session.id, Some(user_msg.seq)).await.unwrap();
        assert_eq!(caught_up.len(), 1);
        assert_eq!(caught_up[0].role, MessageRole::Operator);
        assert_eq!(caught_up[0].content, "Xabaringiz oldi");
        assert_eq!(caught_up[0].seq, 2);
    }
}
