//! POST /chat - dispatch one free-text command against the user's mailbox.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};

use super::chat_error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(dispatch))
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    session_id: String,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
}

async fn dispatch(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    match state
        .dispatcher
        .dispatch(&request.session_id, &request.message)
        .await
    {
        Ok(reply) => Json(ChatResponse { reply }).into_response(),
        Err(err) => chat_error_response(err),
    }
}
