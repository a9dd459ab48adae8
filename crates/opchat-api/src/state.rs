//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST
//! API. Services are generic over repository/channel traits, but AppState
//! pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use secrecy::SecretString;

use opchat_core::chat::service::ChatService;
use opchat_core::relay::adapter::OperatorRelay;
use opchat_infra::config::{load_config, resolve_data_dir};
use opchat_infra::sqlite::chat::SqliteChatRepository;
use opchat_infra::sqlite::pool::DatabasePool;
use opchat_infra::telegram::TelegramChannel;
use opchat_types::config::RelayConfig;

/// Concrete type aliases for the service generics pinned to infra
/// implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository>;

pub type ConcreteRelay = OperatorRelay<SqliteChatRepository, TelegramChannel>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and REST API handlers. The relay and channel
/// stay `None` when no Telegram credentials are configured: messages are
/// still persisted and fanned out to web clients, just not forwarded.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub relay: Option<Arc<ConcreteRelay>>,
    pub telegram: Option<Arc<TelegramChannel>>,
    pub config: RelayConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to the DB,
    /// wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        // Initialize database
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("opchat.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let chat_repo = SqliteChatRepository::new(db_pool.clone());
        let chat_service = Arc::new(ChatService::new(chat_repo));

        // Wire the operator channel when credentials are present.
        let (relay, telegram) = match (
            config.telegram.bot_token.clone(),
            config.telegram.operator_chat_id,
        ) {
            (Some(token), Some(operator_chat_id)) => {
                let channel = Arc::new(TelegramChannel::new(
                    SecretString::from(token),
                    operator_chat_id,
                ));
                let relay = Arc::new(OperatorRelay::new(
                    Arc::clone(&chat_service),
                    Arc::clone(&channel),
                    channel.operator_identity(),
                    config.catalog.products.clone(),
                ));
                (Some(relay), Some(channel))
            }
            _ => {
                tracing::warn!(
                    "telegram bot_token/operator_chat_id not configured; operator relay disabled"
                );
                (None, None)
            }
        };

        Ok(Self {
            chat_service,
            relay,
            telegram,
            config,
            data_dir,
        })
    }
}
