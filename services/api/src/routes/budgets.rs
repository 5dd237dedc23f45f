//! Budget endpoints. Budgets belong to the family root account.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Local;
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    models::{BudgetUpdate, NewBudget, User},
    policy::{can_mutate_ledger, family_ids, ledger_owner_id},
    reports::{self, month_start},
    repositories::TransactionFilter,
    state::AppState,
};

fn read_only() -> ApiError {
    ApiError::Forbidden("Dependent accounts cannot manage budgets".to_string())
}

pub async fn list_budgets(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(
        state.budget_repository.list(ledger_owner_id(&user)).await?,
    ))
}

/// Create a budget. A second budget for the same category returns the first.
pub async fn create_budget(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NewBudget>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }
    payload.validate().map_err(ApiError::BadRequest)?;

    let budget = state
        .budget_repository
        .create_or_get(ledger_owner_id(&user), &payload)
        .await?;

    Ok(Json(budget))
}

pub async fn update_budget(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(payload): Json<BudgetUpdate>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }

    let mut budget = state
        .budget_repository
        .find_by_id(id)
        .await?
        .filter(|b| b.user_id == ledger_owner_id(&user))
        .ok_or_else(|| ApiError::NotFound("Budget not found".to_string()))?;

    payload.merge_into(&mut budget);
    NewBudget {
        category: budget.category.clone(),
        limit_amount: budget.limit_amount,
    }
    .validate()
    .map_err(ApiError::BadRequest)?;

    Ok(Json(state.budget_repository.update(&budget).await?))
}

pub async fn delete_budget(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }

    if !state
        .budget_repository
        .delete(id, ledger_owner_id(&user))
        .await?
    {
        return Err(ApiError::NotFound("Budget not found".to_string()));
    }

    Ok(Json(json!({ "ok": true })))
}

/// Month-to-date spending of every family budget
pub async fn budget_status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    let owner = ledger_owner_id(&user);
    let today = Local::now().date_naive();

    let budgets = state.budget_repository.list(owner).await?;
    let family = family_ids(&state.user_repository, owner).await?;
    let filter = TransactionFilter {
        from: Some(month_start(today)),
        to: Some(today),
        ..TransactionFilter::default()
    };
    let rows = state.transaction_repository.list(&family, &filter).await?;

    Ok(Json(reports::budget_status(&budgets, &rows, today)))
}
