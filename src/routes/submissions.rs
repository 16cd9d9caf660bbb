//! New card and new set submission handlers

use crate::auth::{require_role, Claims, Role};
use crate::change::check;
use crate::error::{ApiResult, AppError};
use crate::models::{NewCard, NewSet, SubmissionStatus, SuccessResponse};
use crate::routes::StatusUpdate;
use crate::state::SharedState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// POST /api/submissions/cards
pub async fn add_card(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(mut card): Json<NewCard>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<NewCard>>)> {
    check(&card).map_err(AppError::InvalidChange)?;

    card.id = Uuid::new_v4();
    card.user_id = claims.sub;
    card.status = SubmissionStatus::Pending;
    card.created_at = Utc::now();
    state.repository.add_card(card.clone()).await?;

    info!(id = %card.id, name = %card.name, "New card submitted");
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Card submitted.", card)),
    ))
}

/// GET /api/submissions/cards
pub async fn list_cards(State(state): State<SharedState>) -> ApiResult<Json<SuccessResponse<Vec<NewCard>>>> {
    let cards = state.repository.get_new_cards().await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} submitted card(s).", cards.len()),
        cards,
    )))
}

/// GET /api/submissions/cards/{id}
pub async fn get_card(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<NewCard>>> {
    let card = state
        .repository
        .get_card(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("New card {} not found", id)))?;
    Ok(Json(SuccessResponse::with_data("Submitted card retrieved.", card)))
}

/// PUT /api/submissions/cards/{id}/status
pub async fn update_card_status(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<SubmissionStatus>>,
) -> ApiResult<Json<SuccessResponse<NewCard>>> {
    require_role(&claims, Role::Moderator)?;
    let card = state.repository.update_new_card_status(id, update.status).await?;
    info!(%id, status = ?card.status, "New card status updated");
    Ok(Json(SuccessResponse::with_data("Status updated.", card)))
}

/// POST /api/submissions/sets
pub async fn add_set(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(mut set): Json<NewSet>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<NewSet>>)> {
    check(&set).map_err(AppError::InvalidChange)?;

    set.id = Uuid::new_v4();
    set.user_id = claims.sub;
    set.status = SubmissionStatus::Pending;
    set.created_at = Utc::now();
    state.repository.add_set(set.clone()).await?;

    info!(id = %set.id, name = %set.name, "New set submitted");
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Set submitted.", set)),
    ))
}

/// GET /api/submissions/sets
pub async fn list_sets(State(state): State<SharedState>) -> ApiResult<Json<SuccessResponse<Vec<NewSet>>>> {
    let sets = state.repository.get_new_sets().await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} submitted set(s).", sets.len()),
        sets,
    )))
}

/// GET /api/submissions/sets/{id}
pub async fn get_set(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<NewSet>>> {
    let set = state
        .repository
        .get_set(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("New set {} not found", id)))?;
    Ok(Json(SuccessResponse::with_data("Submitted set retrieved.", set)))
}

/// PUT /api/submissions/sets/{id}/status
pub async fn update_set_status(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<SubmissionStatus>>,
) -> ApiResult<Json<SuccessResponse<NewSet>>> {
    require_role(&claims, Role::Moderator)?;
    let set = state.repository.update_new_set_status(id, update.status).await?;
    info!(%id, status = ?set.status, "New set status updated");
    Ok(Json(SuccessResponse::with_data("Status updated.", set)))
}
