//! Monthly materialization of recurring transaction templates
//!
//! A template is a transaction with `is_recurring` set. Applying templates
//! creates, for the current month, one plain transaction per template unless a
//! matching instance already exists. Instances are matched on owner,
//! description, amount and category, so re-running within a month is a no-op.

use chrono::{Datelike, NaiveDate};
use common::error::DatabaseResult;
use tracing::info;

use crate::{
    models::Transaction,
    reports::{month_end, month_start},
    repositories::{PlannedInstance, TransactionRepository},
};

/// Day `day` of `today`'s month, clamped to the month's last day
pub fn target_date(day: i32, today: NaiveDate) -> NaiveDate {
    let last = month_end(today).day();
    let day = u32::try_from(day.max(1)).unwrap_or(1).min(last);
    today.with_day(day).unwrap_or(today)
}

/// Whether `candidate` is this month's materialization of `template`
pub fn is_instance_of(template: &Transaction, candidate: &Transaction, since: NaiveDate) -> bool {
    !candidate.is_recurring
        && candidate.user_id == template.user_id
        && candidate.description == template.description
        && candidate.amount == template.amount
        && candidate.category == template.category
        && candidate.date >= since
}

/// Instances to create for `today`'s month. Only rows already stored count
/// as existing instances.
pub fn plan(templates: &[Transaction], existing: &[Transaction], today: NaiveDate) -> Vec<PlannedInstance> {
    let since = month_start(today);

    templates
        .iter()
        .filter(|t| t.is_recurring && t.recurrence_active)
        .filter(|t| !existing.iter().any(|row| is_instance_of(t, row, since)))
        .filter_map(|t| {
            let day = t.recurrence_day?;
            Some(PlannedInstance {
                description: t.description.clone(),
                amount: t.amount,
                kind: t.kind,
                category: t.category.clone(),
                date: target_date(day, today),
                user_id: t.user_id,
            })
        })
        .collect()
}

/// Materialize the active templates of `owner_id` for `today`'s month.
/// Returns the newly created transactions.
pub async fn apply_recurring(
    transactions: &TransactionRepository,
    owner_id: i64,
    today: NaiveDate,
) -> DatabaseResult<Vec<Transaction>> {
    let templates = transactions.active_templates(owner_id).await?;
    if templates.is_empty() {
        return Ok(Vec::new());
    }

    let existing = transactions
        .instances_since(owner_id, month_start(today))
        .await?;
    let planned = plan(&templates, &existing, today);
    if planned.is_empty() {
        return Ok(Vec::new());
    }

    let created = transactions.insert_instances(&planned).await?;
    info!(
        "Applied {} recurring transactions for user {}",
        created.len(),
        owner_id
    );

    Ok(created)
}
