//! Authentication middleware for JWT token validation

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::{debug, warn};

use crate::{
    error::ApiError,
    models::{Role, User},
    state::AppState,
};

/// Validate the bearer token, load its account and insert it into the
/// request extensions as `Extension<User>`
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state
        .jwt_service
        .validate_access_token(bearer.token())
        .map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            ApiError::Unauthorized
        })?;

    let user = state
        .user_repository
        .find_by_username(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !user.is_active {
        warn!("Inactive user {} presented a valid token", user.username);
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Reject callers that are not administrators
pub fn require_admin(user: &User) -> Result<(), ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Administrator privileges required".to_string(),
        ));
    }
    Ok(())
}
