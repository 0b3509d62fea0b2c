//! HTTP handlers for the conversational mailbox service.
//!
//! Routes:
//! - POST /chat - free-text command dispatch
//! - POST /auth/google, POST /auth/me - login and profile
//! - GET /emails, DELETE /emails/{id}, POST /emails/send - direct mailbox access
//! - POST /ai/summarize, POST /ai/replies - batch completion helpers

pub mod ai;
pub mod auth;
pub mod chat;
pub mod emails;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mailpilot_core::{AuthError, ChatError, GatewayError};
use serde::Serialize;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(chat::router())
        .merge(auth::router())
        .merge(emails::router())
        .merge(ai::router())
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiError {
    error: String,
    message: String,
}

impl ApiError {
    fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }

    fn response(status: StatusCode, error: &str, message: impl Into<String>) -> Response {
        (status, Json(Self::new(error, message))).into_response()
    }
}

/// Session problems are the caller's to fix (401); storage problems are ours.
pub(crate) fn auth_error_response(err: AuthError) -> Response {
    match err {
        AuthError::SessionExpired | AuthError::AuthorizationRevoked => {
            ApiError::response(StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
        }
        other => {
            tracing::error!("auth lookup failed: {other}");
            ApiError::response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "authentication lookup failed",
            )
        }
    }
}

pub(crate) fn gateway_error_response(err: GatewayError) -> Response {
    match err {
        GatewayError::NotFound => {
            ApiError::response(StatusCode::NOT_FOUND, "not_found", "message not found")
        }
        GatewayError::Provider { status, message } => {
            tracing::error!("mailbox provider returned {status}: {message}");
            ApiError::response(StatusCode::INTERNAL_SERVER_ERROR, "provider_error", message)
        }
        other => {
            tracing::error!("mailbox request failed: {other}");
            ApiError::response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                other.to_string(),
            )
        }
    }
}

pub(crate) fn chat_error_response(err: ChatError) -> Response {
    match err {
        ChatError::Auth(auth) => auth_error_response(auth),
        ChatError::Gateway(gateway) => gateway_error_response(gateway),
    }
}
