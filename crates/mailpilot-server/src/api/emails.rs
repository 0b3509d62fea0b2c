//! Direct mailbox endpoints, bypassing the chat grammar.
//!
//! - GET /emails - list a page of messages
//! - DELETE /emails/{message_id} - move one message to trash
//! - POST /emails/send - send a message verbatim

use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router, response::IntoResponse};
use mailpilot_core::mailbox::OutgoingMail;
use mailpilot_core::{CredentialSource, MailboxGateway};
use serde::{Deserialize, Serialize};

use super::{auth_error_response, gateway_error_response};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/emails", get(list))
        .route("/emails/{message_id}", delete(trash))
        .route("/emails/send", post(send))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    session_id: String,
    limit: Option<u32>,
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct SendRequest {
    session_id: String,
    to: String,
    subject: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: String,
}

async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> impl IntoResponse {
    let creds = match state.auth.resolve(&query.session_id).await {
        Ok(creds) => creds,
        Err(err) => return auth_error_response(err),
    };

    let limit = query.limit.unwrap_or(state.list_limit);
    match state
        .gateway
        .list(&creds, limit, query.page_token.as_deref())
        .await
    {
        Ok(page) => Json(page).into_response(),
        Err(err) => gateway_error_response(err),
    }
}

async fn trash(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> impl IntoResponse {
    let creds = match state.auth.resolve(&query.session_id).await {
        Ok(creds) => creds,
        Err(err) => return auth_error_response(err),
    };

    match state.gateway.trash(&creds, &message_id).await {
        Ok(()) => Json(StatusResponse {
            status: "deleted".to_string(),
        })
        .into_response(),
        Err(err) => gateway_error_response(err),
    }
}

async fn send(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> impl IntoResponse {
    let creds = match state.auth.resolve(&request.session_id).await {
        Ok(creds) => creds,
        Err(err) => return auth_error_response(err),
    };

    let outgoing = OutgoingMail {
        to: request.to,
        subject: request.subject,
        body: request.body,
    };
    match state.gateway.send(&creds, &outgoing).await {
        Ok(()) => Json(StatusResponse {
            status: "sent".to_string(),
        })
        .into_response(),
        Err(err) => gateway_error_response(err),
    }
}
