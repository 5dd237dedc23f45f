//! Category repository for database operations

use common::error::DatabaseResult;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::Category;

/// Category repository
#[derive(Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, owner_id: i64) -> DatabaseResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, user_id FROM categories WHERE user_id = ? ORDER BY name COLLATE NOCASE",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, user_id FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Create a category, or return the owner's category with the same name
    /// ignoring case
    pub async fn create_or_get(&self, owner_id: i64, name: &str) -> DatabaseResult<Category> {
        let existing = sqlx::query_as::<_, Category>(
            "SELECT id, name, user_id FROM categories WHERE user_id = ? AND LOWER(name) = LOWER(?)",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(category) = existing {
            return Ok(category);
        }

        info!("Creating category {} for user {}", name, owner_id);

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, user_id) VALUES (?, ?) RETURNING id, name, user_id",
        )
        .bind(name)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    pub async fn rename(&self, id: i64, name: &str) -> DatabaseResult<Category> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = ? WHERE id = ? RETURNING id, name, user_id",
        )
        .bind(name)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    /// Scoped delete. Deleting someone else's category affects nothing.
    pub async fn delete(&self, id: i64, owner_id: i64) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
