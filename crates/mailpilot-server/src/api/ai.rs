//! Batch completion endpoints.
//!
//! - POST /ai/summarize - summarize each text, order preserved
//! - POST /ai/replies - N reply variants per text

use axum::{Json, Router, extract::State, routing::post};
use mailpilot_core::completion::{reply_variants_batch, summarize_batch};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/summarize", post(summarize))
        .route("/ai/replies", post(replies))
}

#[derive(Debug, Deserialize)]
struct SummarizeRequest {
    texts: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SummarizeResponse {
    summaries: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RepliesRequest {
    texts: Vec<String>,
    count: usize,
}

#[derive(Debug, Serialize)]
struct RepliesResponse {
    replies: Vec<Vec<String>>,
}

/// Failures are already degraded to inline strings by the batch helpers, so
/// these endpoints always answer 200 with a full-shape body.
async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummarizeRequest>,
) -> Json<SummarizeResponse> {
    let summaries = summarize_batch(state.completions.as_ref(), &request.texts).await;
    Json(SummarizeResponse { summaries })
}

async fn replies(
    State(state): State<AppState>,
    Json(request): Json<RepliesRequest>,
) -> Json<RepliesResponse> {
    let replies =
        reply_variants_batch(state.completions.as_ref(), &request.texts, request.count).await;
    Json(RepliesResponse { replies })
}
