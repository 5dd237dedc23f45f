//! Transaction ledger endpoints

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    models::{NewTransaction, Transaction, TransactionKind, TransactionUpdate, User},
    policy::{can_modify_owner, can_mutate_ledger, visible_owner_ids},
    recurring,
    reports::{self, Grouping},
    repositories::TransactionFilter,
    search::{self, SearchRequest},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
    pub tipo: Option<TransactionKind>,
    pub categoria: Option<String>,
    pub busca: Option<String>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub data_inicio: Option<NaiveDate>,
    pub data_fim: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub data_inicio: NaiveDate,
    pub data_fim: NaiveDate,
    #[serde(default)]
    pub agrupar_por: Grouping,
}

fn not_found() -> ApiError {
    ApiError::NotFound("Transaction not found or no permission".to_string())
}

fn read_only() -> ApiError {
    ApiError::Forbidden("Dependent accounts cannot modify transactions".to_string())
}

/// Load a transaction the caller may modify. Missing rows and rows owned by
/// someone outside the caller's reach look the same.
async fn load_for_update(state: &AppState, user: &User, id: i64) -> ApiResult<Transaction> {
    if !can_mutate_ledger(user) {
        return Err(read_only());
    }

    let tx = state
        .transaction_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    let owner = state
        .user_repository
        .find_by_id(tx.user_id)
        .await?
        .ok_or_else(not_found)?;

    if !can_modify_owner(user, &owner) {
        return Err(not_found());
    }
    Ok(tx)
}

async fn visible_transactions(
    state: &AppState,
    user: &User,
    filter: &TransactionFilter,
) -> ApiResult<Vec<Transaction>> {
    let owners = visible_owner_ids(&state.user_repository, user).await?;
    Ok(state.transaction_repository.list(&owners, filter).await?)
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = TransactionFilter {
        from: query.data_inicio,
        to: query.data_fim,
        kind: query.tipo,
        category: query.categoria.filter(|c| !c.is_empty()),
        text: query.busca.filter(|b| !b.is_empty()),
        skip: query.skip,
        limit: Some(query.limit.clamp(1, 1000)),
    };

    Ok(Json(visible_transactions(&state, &user, &filter).await?))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let tx = state
        .transaction_repository
        .find_by_id(id)
        .await?
        .ok_or_else(not_found)?;

    let owners = visible_owner_ids(&state.user_repository, &user).await?;
    if !owners.contains(&tx.user_id) {
        return Err(not_found());
    }

    Ok(Json(tx))
}

/// Create a transaction for the caller, or for a family member via `user_id`
pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<NewTransaction>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }
    payload.validate().map_err(ApiError::BadRequest)?;

    let owner_id = match payload.user_id {
        Some(owner_id) if owner_id != user.id => {
            let owner = state
                .user_repository
                .find_by_id(owner_id)
                .await?
                .ok_or_else(|| ApiError::BadRequest("Owner account not found".to_string()))?;
            if !can_modify_owner(&user, &owner) {
                return Err(ApiError::Forbidden(
                    "Cannot create transactions for this account".to_string(),
                ));
            }
            owner.id
        }
        _ => user.id,
    };

    let tx = state
        .transaction_repository
        .create(owner_id, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
    Json(payload): Json<TransactionUpdate>,
) -> ApiResult<impl IntoResponse> {
    let mut tx = load_for_update(&state, &user, id).await?;

    let applied = payload.merge_into(&mut tx);
    tx.validate().map_err(ApiError::BadRequest)?;
    tracing::info!("Updating transaction {}: {:?}", id, applied);

    Ok(Json(state.transaction_repository.update(&tx).await?))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let tx = load_for_update(&state, &user, id).await?;
    state.transaction_repository.delete(tx.id).await?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn transaction_stats(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(range): Query<RangeQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = TransactionFilter {
        from: range.data_inicio,
        to: range.data_fim,
        ..TransactionFilter::default()
    };
    let rows = visible_transactions(&state, &user, &filter).await?;

    Ok(Json(reports::transaction_stats(&rows)))
}

pub async fn search_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<impl IntoResponse> {
    let rows = visible_transactions(&state, &user, &TransactionFilter::default()).await?;

    Ok(Json(search::search(rows, &request)))
}

pub async fn period_report(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<impl IntoResponse> {
    if query.data_fim < query.data_inicio {
        return Err(ApiError::BadRequest(
            "data_fim must not be before data_inicio".to_string(),
        ));
    }

    let filter = TransactionFilter {
        from: Some(query.data_inicio),
        to: Some(query.data_fim),
        ..TransactionFilter::default()
    };
    let rows = visible_transactions(&state, &user, &filter).await?;

    Ok(Json(reports::period_report(
        &rows,
        query.data_inicio,
        query.data_fim,
        query.agrupar_por,
    )))
}

pub async fn list_recurring(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    let owners = visible_owner_ids(&state.user_repository, &user).await?;

    Ok(Json(
        state
            .transaction_repository
            .recurring_templates(&owners)
            .await?,
    ))
}

/// Materialize this month's instances of the caller's recurring templates
pub async fn apply_recurring(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    if !can_mutate_ledger(&user) {
        return Err(read_only());
    }

    let today = Local::now().date_naive();
    let created = recurring::apply_recurring(&state.transaction_repository, user.id, today).await?;

    Ok(Json(json!({
        "created": created.len(),
        "transactions": created,
    })))
}

/// Stop a template from producing further instances
pub async fn deactivate_recurring(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let mut tx = load_for_update(&state, &user, id).await?;
    if !tx.is_recurring {
        return Err(ApiError::BadRequest(
            "Transaction is not recurring".to_string(),
        ));
    }

    tx.recurrence_active = false;

    Ok(Json(state.transaction_repository.update(&tx).await?))
}
