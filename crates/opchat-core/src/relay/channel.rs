//! OperatorChannel trait definition.
//!
//! The only way the core reaches the operator, and (for channels that
//! allow addressing users directly) the only way to reach a user by
//! identity. Implementations live in opchat-infra (e.g., `TelegramChannel`).

use opchat_types::error::ChannelError;

/// Outbound port to the external messaging channel.
///
/// Sends are best-effort with a short bounded timeout applied by the
/// implementation; callers on the notify path log failures and move on.
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait OperatorChannel: Send + Sync + 'static {
    /// Send text to the designated operator.
    ///
    /// Returns the channel's message id for the delivered message when the
    /// channel exposes one, so replies referencing it can be correlated.
    fn send_to_operator(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Option<i64>, ChannelError>> + Send;

    /// Send text straight to a channel user's own address.
    ///
    /// The legacy delivery path for users who contacted the operator
    /// through the channel itself rather than the web widget.
    fn send_to_user(
        &self,
        user_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), ChannelError>> + Send;
}
