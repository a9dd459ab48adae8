//! Automated answer endpoint.
//!
//! POST /api/v1/chat takes a free-text message and returns the keyword
//! heuristics' reply over the configured catalog snapshot. No session or
//! operator involvement.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use opchat_core::answer::answer;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/v1/chat - Automated reply for a visitor message.
pub async fn auto_answer(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<ApiResponse<ChatResponse>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let reply = answer(&payload.message, &state.config.catalog.products);

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(ApiResponse::success(
        ChatResponse { reply },
        request_id,
        elapsed,
    ))
}
