//! Login and profile endpoints.
//!
//! - POST /auth/google - exchange an authorization code for a session id
//! - POST /auth/me - session-validated profile lookup

use axum::http::StatusCode;
use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};

use super::{ApiError, auth_error_response};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/google", post(login))
        .route("/auth/me", post(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    code: String,
}

#[derive(Debug, Serialize)]
struct LoginResponse {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct MeRequest {
    session_id: String,
}

#[derive(Debug, Serialize)]
struct MeResponse {
    name: String,
    email: String,
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> impl IntoResponse {
    match state
        .auth
        .login_with_code(&state.oauth, &request.code)
        .await
    {
        Ok(session_id) => Json(LoginResponse { session_id }).into_response(),
        Err(err) => {
            tracing::error!("login failed: {err}");
            ApiError::response(StatusCode::UNAUTHORIZED, "login_failed", err.to_string())
        }
    }
}

async fn me(State(state): State<AppState>, Json(request): Json<MeRequest>) -> impl IntoResponse {
    match state.auth.current_user(&request.session_id).await {
        Ok(profile) => Json(MeResponse {
            name: profile.name,
            email: profile.email,
        })
        .into_response(),
        Err(err) => auth_error_response(err),
    }
}
