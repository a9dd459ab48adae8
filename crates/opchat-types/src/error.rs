use thiserror::Error;

/// Errors from repository operations (used by trait definitions in opchat-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors related to chat session and message operations.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("session not found")]
    SessionNotFound,

    #[error("message content is empty")]
    InvalidContent,

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Errors from the outbound operator channel.
///
/// Delivery failures on the notify path are logged and swallowed; message
/// persistence never depends on them.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("http error: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("channel api error: {0}")]
    Api(String),
}

/// Errors from operator-reply ingestion.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The reply could not be matched to a session or user. Reported back
    /// to the operator as a diagnostic prompt; no message is appended.
    #[error("reply could not be correlated to a session")]
    Unresolved,

    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::SessionNotFound.to_string(), "session not found");
        assert_eq!(
            ChatError::InvalidContent.to_string(),
            "message content is empty"
        );
    }

    #[test]
    fn test_repository_error_wraps_into_chat_error() {
        let err: ChatError = RepositoryError::Query("syntax error".to_string()).into();
        assert!(err.to_string().contains("syntax error"));
    }

    #[test]
    fn test_relay_error_transparent() {
        let err: RelayError = ChannelError::Timeout.into();
        assert_eq!(err.to_string(), "request timed out");
    }
}
