use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use super::extract::ApiJson;
use crate::auth::AuthError;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Username")]
    pub username: String,
    #[serde(alias = "Password")]
    pub password: String,
}

/// Exchange credentials for a bearer token.
///
/// POST /api/v1/auth/login
///
/// Responds with the raw token as `text/plain`, or an empty 401.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Response {
    match state.tokens.issue(&request.username, &request.password).await {
        Ok(token) => {
            tracing::info!(username = %request.username, "Issued access token");
            token.into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(username = %request.username, "Failed login attempt");
            StatusCode::UNAUTHORIZED.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to issue token");
            ApiError::internal("Failed to issue token").into_response()
        }
    }
}
