//! Authentication middleware
//!
//! Validates the bearer token and hands the claims, plus the raw token for
//! calls to the live card database, to handlers via request extensions.

use crate::auth::{Claims, Role};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

/// The caller's access token, forwarded to the live card database
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

pub async fn auth_middleware(
    State(state): State<SharedState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.auth.decode(bearer.token())?;

    request.extensions_mut().insert(claims);
    request
        .extensions_mut()
        .insert(BearerToken(bearer.token().to_string()));

    Ok(next.run(request).await)
}

/// Require at least the given role
pub fn require_role(claims: &Claims, required: Role) -> Result<(), AppError> {
    if !claims.role.satisfies(required) {
        return Err(AppError::Forbidden(format!(
            "Requires {} role, you have {}",
            required, claims.role
        )));
    }

    Ok(())
}
