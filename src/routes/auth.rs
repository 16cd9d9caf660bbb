//! Authentication route handlers
//!
//! Register, login, refresh and current-planeswalker endpoints.

use crate::auth::{Claims, Credentials, Registration, Session, TokenPair};
use crate::error::{ApiResult, AppError};
use crate::models::{Profile, SuccessResponse};
use crate::state::SharedState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/register
///
/// New planeswalkers start with the planeswalker role.
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<Registration>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<Session>>)> {
    let session = state.auth.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Registration successful.", session)),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<Credentials>,
) -> ApiResult<Json<SuccessResponse<Session>>> {
    let session = state.auth.authenticate(req).await?;
    Ok(Json(SuccessResponse::with_data("Login successful.", session)))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<SuccessResponse<TokenPair>>> {
    let tokens = state.auth.refresh(&req.refresh_token).await?;
    Ok(Json(SuccessResponse::with_data("Tokens refreshed.", tokens)))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<SuccessResponse<Profile>>> {
    let walker = state
        .repository
        .get_planeswalker(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Planeswalker not found".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Current planeswalker.",
        Profile::from(&walker),
    )))
}
