//! Account endpoints: own profile, family dependents and administration

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    middleware::require_admin,
    models::{NewUser, ProfileFieldsUpdate, Role, User, UserUpdate},
    policy::{family_root_id, is_dependent},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

pub async fn read_me(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(user)
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ProfileFieldsUpdate>,
) -> ApiResult<impl IntoResponse> {
    let updated = state
        .identity
        .update_user(user.id, UserUpdate::from(payload))
        .await?;

    Ok(Json(updated))
}

/// Dependents of the caller's family
pub async fn list_dependents(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    if is_dependent(&user) {
        return Err(ApiError::Forbidden(
            "Dependents cannot list family members".to_string(),
        ));
    }

    let dependents = state
        .user_repository
        .list_dependents(family_root_id(&user))
        .await?;

    Ok(Json(dependents))
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(page): Query<Pagination>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;

    let users = state
        .user_repository
        .list(page.skip.max(0), page.limit.clamp(1, 1000))
        .await?;

    Ok(Json(users))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;

    let created = state.identity.create_user(payload).await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;

    let found = state
        .user_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(found))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;
    if id == user.id {
        if payload.is_active == Some(false) {
            return Err(ApiError::BadRequest(
                "You cannot deactivate your own account".to_string(),
            ));
        }
        if payload.role.is_some_and(|role| role != Role::Admin) {
            return Err(ApiError::BadRequest(
                "You cannot remove your own admin role".to_string(),
            ));
        }
    }

    let updated = state.identity.update_user(id, payload).await?;

    Ok(Json(updated))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;
    if id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    state.identity.delete_user(id).await?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn toggle_user(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;
    if id == user.id {
        return Err(ApiError::BadRequest(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let toggled = state.identity.toggle_active(id).await?;

    Ok(Json(toggled))
}
