//! Transaction repository for database operations

use chrono::NaiveDate;
use common::error::DatabaseResult;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::models::{NewTransaction, Transaction, TransactionKind};

const TX_COLUMNS: &str = "id, description, amount, type, category, date, user_id, is_recurring, \
     recurrence_day, recurrence_active";

/// Conjunctive filter over the ledger of a set of owners
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<TransactionKind>,
    /// Exact category, compared case-insensitively
    pub category: Option<String>,
    /// Case-insensitive substring of the description
    pub text: Option<String>,
    pub skip: i64,
    pub limit: Option<i64>,
}

/// Row to insert for a materialized recurring instance
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedInstance {
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub user_id: i64,
}

/// Transaction repository
#[derive(Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a transaction for `owner_id`
    pub async fn create(&self, owner_id: i64, new_tx: &NewTransaction) -> DatabaseResult<Transaction> {
        info!("Creating transaction for user {}", owner_id);

        let tx = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (description, amount, type, category, date, user_id,
                                      is_recurring, recurrence_day, recurrence_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {TX_COLUMNS}
            "#
        ))
        .bind(&new_tx.description)
        .bind(new_tx.amount)
        .bind(new_tx.kind.as_str())
        .bind(&new_tx.category)
        .bind(new_tx.date)
        .bind(owner_id)
        .bind(new_tx.is_recurring)
        .bind(new_tx.recurrence_day)
        .bind(new_tx.recurrence_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(tx)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Transaction>> {
        let tx = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TX_COLUMNS} FROM transactions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tx)
    }

    /// Transactions of the given owners matching `filter`, newest first
    pub async fn list(
        &self,
        owner_ids: &[i64],
        filter: &TransactionFilter,
    ) -> DatabaseResult<Vec<Transaction>> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {TX_COLUMNS} FROM transactions WHERE "));
        push_owner_clause(&mut query, owner_ids);

        if let Some(from) = filter.from {
            query.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND date <= ").push_bind(to);
        }
        if let Some(kind) = filter.kind {
            query.push(" AND type = ").push_bind(kind.as_str());
        }
        if let Some(category) = &filter.category {
            query
                .push(" AND LOWER(category) = ")
                .push_bind(category.to_lowercase());
        }
        if let Some(text) = &filter.text {
            query
                .push(" AND instr(LOWER(description), ")
                .push_bind(text.to_lowercase())
                .push(") > 0");
        }

        query.push(" ORDER BY date DESC, id DESC");

        if let Some(limit) = filter.limit {
            query
                .push(" LIMIT ")
                .push_bind(limit)
                .push(" OFFSET ")
                .push_bind(filter.skip.max(0));
        }

        let rows = query
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Recurring templates of the given owners
    pub async fn recurring_templates(&self, owner_ids: &[i64]) -> DatabaseResult<Vec<Transaction>> {
        if owner_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {TX_COLUMNS} FROM transactions WHERE "));
        push_owner_clause(&mut query, owner_ids);
        query.push(" AND is_recurring = 1 ORDER BY recurrence_day, id");

        let rows = query
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Active recurring templates owned by one user
    pub async fn active_templates(&self, owner_id: i64) -> DatabaseResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TX_COLUMNS} FROM transactions
            WHERE user_id = ? AND is_recurring = 1 AND recurrence_active = 1
            ORDER BY id
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Non-recurring rows of one owner dated on or after `since`
    pub async fn instances_since(
        &self,
        owner_id: i64,
        since: NaiveDate,
    ) -> DatabaseResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TX_COLUMNS} FROM transactions
            WHERE user_id = ? AND is_recurring = 0 AND date >= ?
            "#
        ))
        .bind(owner_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Insert all planned instances in one database transaction
    pub async fn insert_instances(
        &self,
        planned: &[PlannedInstance],
    ) -> DatabaseResult<Vec<Transaction>> {
        let mut db_tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(planned.len());

        for instance in planned {
            let row = sqlx::query_as::<_, Transaction>(&format!(
                r#"
                INSERT INTO transactions (description, amount, type, category, date, user_id,
                                          is_recurring, recurrence_day, recurrence_active)
                VALUES (?, ?, ?, ?, ?, ?, 0, NULL, 1)
                RETURNING {TX_COLUMNS}
                "#
            ))
            .bind(&instance.description)
            .bind(instance.amount)
            .bind(instance.kind.as_str())
            .bind(&instance.category)
            .bind(instance.date)
            .bind(instance.user_id)
            .fetch_one(&mut *db_tx)
            .await?;
            created.push(row);
        }

        db_tx.commit().await?;

        Ok(created)
    }

    /// Write back every mutable column of an already merged transaction
    pub async fn update(&self, tx: &Transaction) -> DatabaseResult<Transaction> {
        let row = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET description = ?, amount = ?, type = ?, category = ?, date = ?,
                is_recurring = ?, recurrence_day = ?, recurrence_active = ?
            WHERE id = ?
            RETURNING {TX_COLUMNS}
            "#
        ))
        .bind(&tx.description)
        .bind(tx.amount)
        .bind(tx.kind.as_str())
        .bind(&tx.category)
        .bind(tx.date)
        .bind(tx.is_recurring)
        .bind(tx.recurrence_day)
        .bind(tx.recurrence_active)
        .bind(tx.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn push_owner_clause(query: &mut QueryBuilder<'_, Sqlite>, owner_ids: &[i64]) {
    query.push("user_id IN (");
    let mut ids = query.separated(", ");
    for id in owner_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");
}
