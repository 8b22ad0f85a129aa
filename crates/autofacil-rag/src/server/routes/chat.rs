//! Question answering endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /chat - Answer a question from the indexed documents
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    match state.query_pipeline().answer(&request.question).await {
        Ok(answer) => Ok(Json(ChatResponse::Answer {
            question: answer.question,
            answer: answer.answer,
        })),
        Err(e) if e.is_client_error() => Ok(Json(ChatResponse::Error {
            error: e.user_message(),
        })),
        Err(e) => Err(e),
    }
}
