//! Category endpoints. Categories belong to the family root account.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    models::{CategoryPayload, User},
    policy::{can_mutate_ledger, ledger_owner_id},
    state::AppState,
};

fn read_only() -> ApiError {
    ApiError::Forbidden("Dependent accounts cannot manage categories".to_string())
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state
            .category_repository
            .list(ledger_owner_id(&user))
            .await?,
    ))
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }
    payload.validate().map_err(ApiError::BadRequest)?;

    let category = state
        .category_repository
        .create_or_get(ledger_owner_id(&user), payload.name.trim())
        .await?;

    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }
    payload.validate().map_err(ApiError::BadRequest)?;

    let category = state
        .category_repository
        .find_by_id(id)
        .await?
        .filter(|c| c.user_id == ledger_owner_id(&user))
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(
        state
            .category_repository
            .rename(category.id, payload.name.trim())
            .await?,
    ))
}

/// Scoped delete. Ids the caller does not own are silently ignored.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }

    let deleted = state
        .category_repository
        .delete(id, ledger_owner_id(&user))
        .await?;

    Ok(Json(json!({ "ok": true, "deleted": deleted })))
}
