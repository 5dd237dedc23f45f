//! Budget repository for database operations

use common::error::DatabaseResult;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{Budget, NewBudget};

/// Budget repository
#[derive(Clone)]
pub struct BudgetRepository {
    pool: SqlitePool,
}

impl BudgetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, owner_id: i64) -> DatabaseResult<Vec<Budget>> {
        let budgets = sqlx::query_as::<_, Budget>(
            "SELECT id, category, limit_amount, user_id FROM budgets WHERE user_id = ? ORDER BY category",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Budget>> {
        let budget = sqlx::query_as::<_, Budget>(
            "SELECT id, category, limit_amount, user_id FROM budgets WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    /// Budget for `category`, compared case-insensitively
    pub async fn find_by_category(
        &self,
        owner_id: i64,
        category: &str,
    ) -> DatabaseResult<Option<Budget>> {
        let budget = sqlx::query_as::<_, Budget>(
            "SELECT id, category, limit_amount, user_id FROM budgets WHERE user_id = ? AND LOWER(category) = LOWER(?)",
        )
        .bind(owner_id)
        .bind(category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    /// Create a budget, or return the owner's existing budget for the same category
    pub async fn create_or_get(&self, owner_id: i64, new_budget: &NewBudget) -> DatabaseResult<Budget> {
        if let Some(existing) = self.find_by_category(owner_id, &new_budget.category).await? {
            info!(
                "Budget for {} already exists for user {}",
                new_budget.category, owner_id
            );
            return Ok(existing);
        }

        let budget = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (category, limit_amount, user_id)
            VALUES (?, ?, ?)
            RETURNING id, category, limit_amount, user_id
            "#,
        )
        .bind(&new_budget.category)
        .bind(new_budget.limit_amount)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(budget)
    }

    pub async fn update(&self, budget: &Budget) -> DatabaseResult<Budget> {
        let budget = sqlx::query_as::<_, Budget>(
            r#"
            UPDATE budgets SET category = ?, limit_amount = ?
            WHERE id = ?
            RETURNING id, category, limit_amount, user_id
            "#,
        )
        .bind(&budget.category)
        .bind(budget.limit_amount)
        .bind(budget.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(budget)
    }

    /// Delete a budget if `owner_id` owns it
    pub async fn delete(&self, id: i64, owner_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
