//! Computed views: category analytics and the legacy summary

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    models::User,
    policy::{ledger_owner_id, visible_owner_ids},
    reports::{self, month_end, month_start},
    repositories::TransactionFilter,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    /// `YYYY-MM`, defaults to the current month
    pub mes: Option<String>,
}

fn parse_month(value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid month '{value}', expected YYYY-MM")))
}

pub async fn category_analytics(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<impl IntoResponse> {
    let month = match query.mes.as_deref().filter(|m| !m.is_empty()) {
        Some(mes) => parse_month(mes)?,
        None => Local::now().date_naive(),
    };

    let owners = visible_owner_ids(&state.user_repository, &user).await?;
    let filter = TransactionFilter {
        from: Some(month_start(month)),
        to: Some(month_end(month)),
        ..TransactionFilter::default()
    };
    let rows = state.transaction_repository.list(&owners, &filter).await?;

    Ok(Json(reports::category_analytics(&rows, month)))
}

/// Whole-ledger summary with income-boosted budget limits
pub async fn legacy_summary(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    let owners = visible_owner_ids(&state.user_repository, &user).await?;
    let rows = state
        .transaction_repository
        .list(&owners, &TransactionFilter::default())
        .await?;
    let budgets = state.budget_repository.list(ledger_owner_id(&user)).await?;

    Ok(Json(reports::legacy_summary(&budgets, &rows)))
}
