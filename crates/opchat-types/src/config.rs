//! Global configuration types for opchat.
//!
//! `RelayConfig` represents the top-level `config.toml` that controls the
//! HTTP server, the Telegram operator channel, and the product catalog used
//! for automated answers.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Top-level configuration for the relay.
///
/// Loaded from `~/.opchat/config.toml`. All fields have sensible defaults;
/// the Telegram section stays empty until a token is configured (via the
/// file or `OPCHAT_TELEGRAM_TOKEN` / `OPCHAT_OPERATOR_CHAT_ID`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Telegram operator-channel settings.
///
/// When `bot_token` or `operator_chat_id` is absent, the relay runs without
/// an operator channel: messages are persisted and fanned out to web
/// clients, but nothing is forwarded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,

    /// Chat id of the designated operator.
    pub operator_chat_id: Option<i64>,

    /// Long-poll wait passed to getUpdates, in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_poll_timeout_secs() -> u64 {
    30
}

/// Product catalog snapshot used by the automated answer heuristics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub products: Vec<CatalogProduct>,
}

/// One catalog entry: a product name and its fuel kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub name: String,
    pub kind: FuelKind,
}

/// Fuel product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelKind {
    Benzin,
    Dizel,
    Neft,
}

impl fmt::Display for FuelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelKind::Benzin => write!(f, "benzin"),
            FuelKind::Dizel => write!(f, "dizel"),
            FuelKind::Neft => write!(f, "neft"),
        }
    }
}

impl FromStr for FuelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "benzin" => Ok(FuelKind::Benzin),
            "dizel" => Ok(FuelKind::Dizel),
            "neft" => Ok(FuelKind::Neft),
            other => Err(format!("invalid fuel kind: '{other}'")),
        }
    }
}
