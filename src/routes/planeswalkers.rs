//! Planeswalker profile and collection handlers

use crate::auth::{require_role, Claims, Role};
use crate::change::check;
use crate::error::{ApiResult, AppError};
use crate::models::{MessageResponse, Profile, ProfileUpdate, SuccessResponse, UserCard};
use crate::state::SharedState;
use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddUserCard {
    pub mvid: i32,
    #[validate(length(min = 1, message = "Card set id must not be empty"))]
    pub card_set_id: String,
    #[validate(range(min = 1, message = "Amount must be at least 1"))]
    pub amount: i32,
}

/// Collection lookup: `?set=LEA` or `?mvids=1,2,3`
#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    pub set: Option<String>,
    pub mvids: Option<String>,
}

fn parse_mvids(raw: &str) -> Result<Vec<i32>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>()
                .map_err(|_| AppError::Validation(format!("Invalid multiverse id '{}'", s)))
        })
        .collect()
}

async fn load(state: &SharedState, id: Uuid) -> Result<crate::models::Planeswalker, AppError> {
    state
        .repository
        .get_planeswalker(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Planeswalker {} not found", id)))
}

/// GET /api/planeswalkers/me
pub async fn get_profile(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<SuccessResponse<Profile>>> {
    let walker = load(&state, claims.sub).await?;
    Ok(Json(SuccessResponse::with_data("Profile retrieved.", Profile::from(&walker))))
}

/// PUT /api/planeswalkers/me
pub async fn update_profile(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult<Json<SuccessResponse<Profile>>> {
    check(&update).map_err(AppError::InvalidChange)?;

    let mut walker = load(&state, claims.sub).await?;
    if let Some(email) = update.email {
        walker.email = email;
    }
    let walker = state.repository.update_planeswalker(walker).await?;

    Ok(Json(SuccessResponse::with_data("Profile updated.", Profile::from(&walker))))
}

/// DELETE /api/planeswalkers/me
pub async fn remove_profile(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<MessageResponse>> {
    state.repository.remove_planeswalker(claims.sub).await?;
    info!(user_name = %claims.user_name, "Planeswalker removed");
    Ok(Json(MessageResponse::new("Profile removed.")))
}

/// PUT /api/planeswalkers/{id}/role
pub async fn update_role(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(update): Json<RoleUpdate>,
) -> ApiResult<Json<SuccessResponse<Profile>>> {
    require_role(&claims, Role::Admin)?;

    let mut walker = load(&state, id).await?;
    walker.role = update.role;
    let walker = state.repository.update_planeswalker(walker).await?;

    info!(user_name = %walker.user_name, role = %walker.role, "Role updated");
    Ok(Json(SuccessResponse::with_data("Role updated.", Profile::from(&walker))))
}

/// POST /api/planeswalkers/me/cards
pub async fn add_card(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AddUserCard>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<UserCard>>)> {
    check(&req).map_err(AppError::InvalidChange)?;

    let card = state
        .repository
        .add_user_card(claims.sub, req.mvid, &req.card_set_id, req.amount)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Card added to collection.", card)),
    ))
}

/// GET /api/planeswalkers/me/cards
pub async fn list_cards(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<CollectionQuery>,
) -> ApiResult<Json<SuccessResponse<Vec<UserCard>>>> {
    let cards = match (query.set, query.mvids) {
        (Some(set), _) => state.repository.get_user_cards_by_set(claims.sub, &set).await?,
        (None, Some(mvids)) => {
            let mvids = parse_mvids(&mvids)?;
            state.repository.get_user_cards(claims.sub, &mvids).await?
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "Either 'set' or 'mvids' must be given".to_string(),
            ))
        }
    };

    Ok(Json(SuccessResponse::with_data(
        format!("Found {} card(s).", cards.len()),
        cards,
    )))
}
