//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions                - Create a session
//! - GET  /api/v1/sessions/{id}           - Get a session
//! - GET  /api/v1/sessions/{id}/messages  - History / polling catch-up

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use opchat_types::chat::{ChatMessage, ChatSession};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Body for session creation. The whole body is optional.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Query parameters for the polling read.
#[derive(Debug, Deserialize)]
pub struct PollQuery {
    /// Cursor: only messages with a strictly greater position are returned.
    #[serde(default)]
    pub since: Option<i64>,
}

/// Parse a UUID from a path parameter, returning a 400 error on invalid
/// format.
pub(crate) fn parse_uuid(s: &str) -> Result<Uuid, AppError> {
    s.parse::<Uuid>()
        .map_err(|_| AppError::Validation(format!("Invalid UUID: {s}")))
}

/// POST /api/v1/sessions - Create a new session.
///
/// Returns the session; its history is empty by construction.
pub async fn create_session(
    State(state): State<AppState>,
    payload: Option<Json<CreateSessionRequest>>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let user_id = payload.and_then(|Json(body)| body.user_id);
    let session = state.chat_service.create_session(user_id).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(session, request_id, elapsed))
}

/// GET /api/v1/sessions/{id} - Get a session by ID.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<ApiResponse<ChatSession>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let session = state.chat_service.get_session(&sid).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(session, request_id, elapsed))
}

/// GET /api/v1/sessions/{id}/messages - Messages after the `since` cursor.
///
/// Without `since` this is the full history. The same shape the WebSocket
/// pushes, so a client can switch between the two using its last-seen
/// `seq` as the cursor.
pub async fn list_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<PollQuery>,
) -> Result<ApiResponse<Vec<ChatMessage>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;
    let messages = state.chat_service.poll(&sid, query.since).await?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(messages, request_id, elapsed))
}
