//! Card change request handlers

use crate::auth::{require_role, BearerToken, Claims, Role};
use crate::change::{CardField, ChangeRequest, ChangeStatus};
use crate::error::{ApiResult, AppError};
use crate::models::SuccessResponse;
use crate::moderation::ChangeReview;
use crate::routes::{StatusFilter, StatusUpdate};
use crate::state::SharedState;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

/// POST /api/cards/{mvid}/changes
pub async fn submit(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(mvid): Path<i32>,
    Json(proposal): Json<ChangeRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<ChangeRequest>>)> {
    let change = state
        .moderation
        .submit_card_change(claims.sub, mvid, proposal)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Change request submitted.", change)),
    ))
}

/// GET /api/cards/{mvid}/changes
pub async fn list_for_card(
    State(state): State<SharedState>,
    Path(mvid): Path<i32>,
) -> ApiResult<Json<SuccessResponse<Vec<ChangeRequest>>>> {
    let changes = state.moderation.card_changes(mvid).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} change request(s) for card {}.", changes.len(), mvid),
        changes,
    )))
}

/// GET /api/changes
pub async fn list(
    State(state): State<SharedState>,
    Query(filter): Query<StatusFilter<ChangeStatus>>,
) -> ApiResult<Json<SuccessResponse<Vec<ChangeRequest>>>> {
    let changes = state.moderation.all_card_changes(filter.status).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} change request(s).", changes.len()),
        changes,
    )))
}

/// GET /api/changes/{id}
pub async fn review(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<ChangeReview<ChangeRequest, CardField>>>> {
    let review = state.moderation.review_card_change(id).await?;
    Ok(Json(SuccessResponse::with_data("Change request retrieved.", review)))
}

/// POST /api/changes/{id}/fields/{field}/accept
pub async fn accept_field(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    Path((id, field)): Path<(Uuid, String)>,
) -> ApiResult<Json<SuccessResponse<ChangeRequest>>> {
    require_role(&claims, Role::Moderator)?;

    let field: CardField = field
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown card field '{}'", field)))?;

    let change = state.moderation.accept_card_field(&token, id, field).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Field '{}' accepted.", field),
        change,
    )))
}

/// PUT /api/changes/{id}/status
pub async fn update_status(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<ChangeStatus>>,
) -> ApiResult<Json<SuccessResponse<ChangeRequest>>> {
    require_role(&claims, Role::Moderator)?;
    let change = state
        .moderation
        .update_card_change_status(id, update.status)
        .await?;
    Ok(Json(SuccessResponse::with_data("Status updated.", change)))
}
