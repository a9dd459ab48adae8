//! TelegramChannel -- concrete [`OperatorChannel`] implementation for the
//! Telegram Bot API.
//!
//! The bot token is wrapped in [`secrecy::SecretString`] and is only
//! exposed when building request URLs; request errors are stripped of
//! their URL before they reach a log line.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use opchat_core::relay::channel::OperatorChannel;
use opchat_types::error::ChannelError;

use super::types::{ApiEnvelope, TgMessage, TgUpdate};

/// Bounded timeout for ordinary sends. A timed-out notification is a
/// logged delivery failure, nothing more.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram Bot API operator channel.
pub struct TelegramChannel {
    client: reqwest::Client,
    token: SecretString,
    operator_chat_id: i64,
    base_url: String,
}

impl TelegramChannel {
    /// Create a new channel for the given bot token and operator chat.
    pub fn new(token: SecretString, operator_chat_id: i64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            token,
            operator_chat_id,
            base_url: "https://api.telegram.org".to_string(),
        }
    }

    /// The operator's channel identity, as it appears on inbound events.
    pub fn operator_identity(&self) -> String {
        self.operator_chat_id.to_string()
    }

    /// Override the base URL (useful for testing or proxies).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.base_url,
            self.token.expose_secret()
        )
    }

    /// Call `sendMessage` and return the delivered message's id.
    pub(crate) async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
    ) -> Result<i64, ChannelError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let envelope: ApiEnvelope<TgMessage> = response
            .json()
            .await
            .map_err(|_| ChannelError::Api(format!("sendMessage returned {status}")))?;

        if !envelope.ok {
            return Err(ChannelError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("sendMessage returned {status}")),
            ));
        }

        envelope
            .result
            .map(|m| m.message_id)
            .ok_or_else(|| ChannelError::Api("sendMessage result missing".to_string()))
    }

    /// Long-poll `getUpdates`.
    ///
    /// The per-request timeout is the long-poll wait plus headroom, so a
    /// quiet channel does not look like a failure.
    pub(crate) async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout_secs: u64,
    ) -> Result<Vec<TgUpdate>, ChannelError> {
        let mut query = vec![("timeout", poll_timeout_secs as i64)];
        if let Some(offset) = offset {
            query.push(("offset", offset));
        }

        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .query(&query)
            .timeout(Duration::from_secs(poll_timeout_secs + 10))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let envelope: ApiEnvelope<Vec<TgUpdate>> = response
            .json()
            .await
            .map_err(|_| ChannelError::Api(format!("getUpdates returned {status}")))?;

        if !envelope.ok {
            return Err(ChannelError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| format!("getUpdates returned {status}")),
            ));
        }

        Ok(envelope.result.unwrap_or_default())
    }
}

/// Map a reqwest error, dropping the URL (it embeds the bot token).
fn request_error(err: reqwest::Error) -> ChannelError {
    if err.is_timeout() {
        ChannelError::Timeout
    } else {
        ChannelError::Http(err.without_url().to_string())
    }
}

impl OperatorChannel for TelegramChannel {
    async fn send_to_operator(&self, text: &str) -> Result<Option<i64>, ChannelError> {
        self.send_message(self.operator_chat_id, text)
            .await
            .map(Some)
    }

    async fn send_to_user(&self, user_id: &str, text: &str) -> Result<(), ChannelError> {
        let chat_id: i64 = user_id
            .parse()
            .map_err(|_| ChannelError::Api(format!("'{user_id}' is not a telegram chat id")))?;
        self.send_message(chat_id, text).await.map(|_| ())
    }
}

impl std::fmt::Debug for TelegramChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramChannel")
            .field("operator_chat_id", &self.operator_chat_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}
