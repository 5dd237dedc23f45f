//! User repository for database operations

use common::error::DatabaseResult;
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, is_active, is_subscriber, \
     parent_id, full_name, phone, birth_date, currency, created_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user whose password has already been hashed
    pub async fn create(&self, new_user: &NewUser, password_hash: &str) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.username);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role, is_active, is_subscriber,
                               parent_id, full_name, phone, birth_date, currency)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(password_hash)
        .bind(new_user.role.as_str())
        .bind(new_user.is_active)
        .bind(new_user.is_subscriber)
        .bind(new_user.parent_id)
        .bind(&new_user.full_name)
        .bind(&new_user.phone)
        .bind(new_user.birth_date)
        .bind(&new_user.currency)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by username
    pub async fn find_by_username(&self, username: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// List users ordered by id
    pub async fn list(&self, skip: i64, limit: i64) -> DatabaseResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Total number of accounts
    pub async fn count(&self) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Direct dependents of an account
    pub async fn list_dependents(&self, parent_id: i64) -> DatabaseResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE parent_id = ? ORDER BY id"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn count_dependents(&self, parent_id: i64) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE parent_id = ?")
            .bind(parent_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Ids of the direct dependents of an account
    pub async fn dependent_ids(&self, parent_id: i64) -> DatabaseResult<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM users WHERE parent_id = ?")
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    /// Write back every mutable column of an already merged user
    pub async fn update(&self, user: &User) -> DatabaseResult<User> {
        info!("Updating user: {}", user.id);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = ?, email = ?, password_hash = ?, role = ?, is_active = ?,
                is_subscriber = ?, parent_id = ?, full_name = ?, phone = ?, birth_date = ?,
                currency = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.is_subscriber)
        .bind(user.parent_id)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.birth_date)
        .bind(&user.currency)
        .bind(user.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Delete an account together with its dependents and every ledger row
    /// they own, in a single transaction. Returns false if the user did not exist.
    pub async fn delete_cascade(&self, id: i64) -> DatabaseResult<bool> {
        info!("Deleting user {} and owned records", id);

        let mut tx = self.pool.begin().await?;

        let dependents: Vec<i64> = sqlx::query_scalar("SELECT id FROM users WHERE parent_id = ?")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        for owner in dependents.iter().copied().chain(std::iter::once(id)) {
            for table in ["transactions", "budgets", "categories"] {
                sqlx::query(&format!("DELETE FROM {table} WHERE user_id = ?"))
                    .bind(owner)
                    .execute(&mut *tx)
                    .await?;
            }
            if owner != id {
                sqlx::query("DELETE FROM users WHERE id = ?")
                    .bind(owner)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(deleted > 0)
    }
}
