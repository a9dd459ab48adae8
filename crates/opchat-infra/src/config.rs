//! Configuration loader for opchat.
//!
//! Reads `config.toml` from the data directory (`~/.opchat/` in production)
//! and deserializes it into [`RelayConfig`]. Falls back to defaults when
//! the file is missing or malformed. Telegram credentials can always be
//! supplied or overridden through the environment.

use std::path::{Path, PathBuf};

use opchat_types::config::RelayConfig;

/// Resolve the data directory: `OPCHAT_DATA_DIR`, falling back to
/// `~/.opchat`.
pub fn resolve_data_dir() -> PathBuf {
    match std::env::var("OPCHAT_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".opchat")
        }
    }
}

/// Load configuration from `{data_dir}/config.toml`, then apply env
/// overrides.
///
/// - If the file does not exist, starts from [`RelayConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and starts from
///   the default.
/// - `OPCHAT_TELEGRAM_TOKEN` and `OPCHAT_OPERATOR_CHAT_ID` override the
///   corresponding Telegram fields so secrets can stay out of the file.
pub async fn load_config(data_dir: &Path) -> RelayConfig {
    let config_path = data_dir.join("config.toml");

    let mut config = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => match toml::from_str::<RelayConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Failed to parse {}: {err}, using defaults",
                    config_path.display()
                );
                RelayConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(
                "No config.toml found at {}, using defaults",
                config_path.display()
            );
            RelayConfig::default()
        }
        Err(err) => {
            tracing::warn!(
                "Failed to read {}: {err}, using defaults",
                config_path.display()
            );
            RelayConfig::default()
        }
    };

    if let Ok(token) = std::env::var("OPCHAT_TELEGRAM_TOKEN")
        && !token.is_empty()
    {
        config.telegram.bot_token = Some(token);
    }
    if let Ok(chat_id) = std::env::var("OPCHAT_OPERATOR_CHAT_ID") {
        match chat_id.parse::<i64>() {
            Ok(id) => config.telegram.operator_chat_id = Some(id),
            Err(_) => tracing::warn!("OPCHAT_OPERATOR_CHAT_ID is not a number, ignoring"),
        }
    }

    config
}
