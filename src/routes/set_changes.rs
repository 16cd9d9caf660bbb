//! Card set change request handlers

use crate::auth::{require_role, BearerToken, Claims, Role};
use crate::change::{ChangeStatus, SetChangeRequest, SetField};
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

/// POST /api/sets/{set_id}/changes
pub async fn submit(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(set_id): Path<String>,
    Json(proposal): Json<SetChangeRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<SetChangeRequest>>)> {
    let change = state
        .moderation
        .submit_set_change(claims.sub, &set_id, proposal)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Set change request submitted.", change)),
    ))
}

/// GET /api/sets/{set_id}/changes
pub async fn list_for_set(
    State(state): State<SharedState>,
    Path(set_id): Path<String>,
) -> ApiResult<Json<SuccessResponse<Vec<SetChangeRequest>>>> {
    let changes = state.moderation.set_changes(&set_id).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} change request(s) for set {}.", changes.len(), set_id),
        changes,
    )))
}

/// GET /api/set-changes
pub async fn list(
    State(state): State<SharedState>,
    Query(filter): Query<StatusFilter<ChangeStatus>>,
) -> ApiResult<Json<SuccessResponse<Vec<SetChangeRequest>>>> {
    let changes = state.moderation.all_set_changes(filter.status).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} set change request(s).", changes.len()),
        changes,
    )))
}

/// GET /api/set-changes/{id}
pub async fn review(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<ChangeReview<SetChangeRequest, SetField>>>> {
    let review = state.moderation.review_set_change(id).await?;
    Ok(Json(SuccessResponse::with_data("Set change request retrieved.", review)))
}

/// POST /api/set-changes/{id}/fields/{field}/accept
pub async fn accept_field(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Extension(BearerToken(token)): Extension<BearerToken>,
    Path((id, field)): Path<(Uuid, String)>,
) -> ApiResult<Json<SuccessResponse<SetChangeRequest>>> {
    require_role(&claims, Role::Moderator)?;

    let field: SetField = field
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown set field '{}'", field)))?;

    let change = state.moderation.accept_set_field(&token, id, field).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Field '{}' accepted.", field),
        change,
    )))
}

/// PUT /api/set-changes/{id}/status
pub async fn update_status(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<StatusUpdate<ChangeStatus>>,
) -> ApiResult<Json<SuccessResponse<SetChangeRequest>>> {
    require_role(&claims, Role::Moderator)?;
    let change = state
        .moderation
        .update_set_change_status(id, update.status)
        .await?;
    Ok(Json(SuccessResponse::with_data("Status updated.", change)))
}
