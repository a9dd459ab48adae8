//! Telegram operator-channel implementation.
//!
//! The operator is reached through a Telegram bot: outbound sends go
//! through the Bot API `sendMessage` method, inbound traffic arrives via
//! long-polling `getUpdates`.

pub mod client;
pub mod types;
pub mod updates;

pub use client::TelegramChannel;
