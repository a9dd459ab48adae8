//! Message send handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions/{id}/messages - Append a visitor message
//! - POST /api/v1/questions              - Create-or-reuse a session, then append
//!
//! Both persist first and notify the operator second: the notification is
//! a detached best-effort send that can never fail the append.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use opchat_types::chat::{ChatMessage, MessageRole};
use opchat_types::error::ChatError;

use crate::http::error::AppError;
use crate::http::handlers::session::parse_uuid;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Body for the create-or-reuse entry point.
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub session_id: Uuid,
    pub message: ChatMessage,
}

/// POST /api/v1/sessions/{id}/messages - Append a visitor message.
///
/// 404 on unknown session, 400 on empty content. Returns the persisted
/// message with its assigned position.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<ApiResponse<ChatMessage>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let session = state.chat_service.get_session(&sid).await?;
    let message = state
        .chat_service
        .append_message(&sid, MessageRole::User, &payload.content)
        .await?;

    if let Some(relay) = &state.relay {
        relay.notify_operator(&session, &message);
    }

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(message, request_id, elapsed))
}

/// POST /api/v1/questions - One-shot entry point for the web widget.
///
/// Reuses the given session when it still exists (backfilling its user id,
/// first-write-wins), creates a fresh one otherwise, then appends and
/// forwards like an ordinary send.
pub async fn send_question(
    State(state): State<AppState>,
    Json(payload): Json<QuestionRequest>,
) -> Result<ApiResponse<QuestionResponse>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    if payload.content.trim().is_empty() {
        return Err(AppError::Chat(ChatError::InvalidContent));
    }

    let session = match &payload.session_id {
        Some(raw_id) => {
            let sid = parse_uuid(raw_id)?;
            match state.chat_service.get_session(&sid).await {
                Ok(session) => match &payload.user_id {
                    Some(user_id) => state.chat_service.attach_user_id(&sid, user_id).await?,
                    None => session,
                },
                // A stale id from a previous server run: start over.
                Err(ChatError::SessionNotFound) => {
                    state
                        .chat_service
                        .create_session(payload.user_id.clone())
                        .await?
                }
                Err(err) => return Err(err.into()),
            }
        }
        None => {
            state
                .chat_service
                .create_session(payload.user_id.clone())
                .await?
        }
    };

    let message = state
        .chat_service
        .append_message(&session.id, MessageRole::User, &payload.content)
        .await?;

    if let Some(relay) = &state.relay {
        relay.notify_operator(&session, &message);
    }

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(
        QuestionResponse {
            session_id: session.id,
            message,
        },
        request_id,
        elapsed,
    ))
}
