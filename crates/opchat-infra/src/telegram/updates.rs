//! Long-poll loop feeding Telegram updates into the operator relay.
//!
//! Runs until the shutdown token fires. Bot commands (`/start`, `/id`) are
//! answered here; everything else becomes an [`OperatorEvent`] for
//! [`OperatorRelay::ingest`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use opchat_core::chat::repository::ChatRepository;
use opchat_core::relay::adapter::OperatorRelay;
use opchat_types::error::RelayError;
use opchat_types::relay::OperatorEvent;

use super::client::TelegramChannel;
use super::types::TgMessage;

/// Pause after a failed `getUpdates` before retrying.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Run the update loop until cancelled.
pub async fn run_update_loop<R>(
    relay: Arc<OperatorRelay<R, TelegramChannel>>,
    channel: Arc<TelegramChannel>,
    poll_timeout_secs: u64,
    shutdown: CancellationToken,
) where
    R: ChatRepository + 'static,
{
    info!("telegram update loop started");
    let mut offset: Option<i64> = None;

    loop {
        let updates = tokio::select! {
            _ = shutdown.cancelled() => break,
            result = channel.get_updates(offset, poll_timeout_secs) => match result {
                Ok(updates) => updates,
                Err(err) => {
                    warn!(error = %err, "getUpdates failed, retrying");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => continue,
                    }
                }
            },
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.as_deref() else {
                continue;
            };

            // Bot commands are answered here and never relayed.
            if text.trim_start().starts_with('/') {
                if let Some(reply) = command_reply(text, message.chat.id) {
                    if let Err(err) = channel.send_message(message.chat.id, &reply).await {
                        warn!(chat_id = message.chat.id, error = %err, "command reply failed");
                    }
                }
                continue;
            }

            let event = event_from_message(&message);
            match relay.ingest(event).await {
                Ok(outcome) => debug!(?outcome, "update ingested"),
                Err(RelayError::Unresolved) => {
                    debug!(chat_id = message.chat.id, "operator reply unresolved");
                }
                Err(err) => warn!(error = %err, "update ingestion failed"),
            }
        }
    }

    info!("telegram update loop stopped");
}

/// Canned reply for a known bot command.
fn command_reply(text: &str, chat_id: i64) -> Option<String> {
    match text.trim().split_whitespace().next()? {
        "/start" => Some(
            "Salom! Savolingizni yozing, admin javobini shu yerda olasiz.".to_string(),
        ),
        "/id" => Some(format!("Chat ID: {chat_id}")),
        _ => None,
    }
}

/// Convert an inbound Telegram message into a channel-agnostic event.
fn event_from_message(message: &TgMessage) -> OperatorEvent {
    OperatorEvent {
        sender: message.chat.id.to_string(),
        text: message.text.clone().unwrap_or_default(),
        replied_to_text: message
            .reply_to_message
            .as_ref()
            .and_then(|m| m.text.clone()),
        replied_to_message_id: message.reply_to_message.as_ref().map(|m| m.message_id),
    }
}
