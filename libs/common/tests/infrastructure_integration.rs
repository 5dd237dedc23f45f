//! Integration tests for the infrastructure components
//!
//! These tests verify that the SQLite database can be opened, migrated and
//! queried from the application.

use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use sqlx::Row;

/// Opens a private in-memory database, applies the schema and checks
/// that the ledger tables accept rows.
#[tokio::test]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    run_migrations(&pool).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i64 = row.get("result");
    assert_eq!(result, 1, "SQLite simple query test failed");

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, password_hash) VALUES ('ana', 'x') RETURNING id",
    )
    .fetch_one(&pool)
    .await?;

    sqlx::query(
        "INSERT INTO transactions (description, amount, type, category, date, user_id)
         VALUES ('Salary', 1000.0, 'income', 'Salary', '2025-01-05', ?)",
    )
    .bind(user_id)
    .execute(&pool)
    .await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 1);

    Ok(())
}

/// Migrations are idempotent: running them twice is a no-op
#[tokio::test]
async fn test_migrations_run_twice() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    run_migrations(&pool).await?;
    run_migrations(&pool).await?;
    Ok(())
}

/// A second budget for the same owner and category violates the schema
#[tokio::test]
async fn test_budget_uniqueness_is_enforced() -> Result<(), Box<dyn std::error::Error>> {
    let pool = init_pool(&DatabaseConfig::in_memory()).await?;
    run_migrations(&pool).await?;

    let user_id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, password_hash) VALUES ('ana', 'x') RETURNING id",
    )
    .fetch_one(&pool)
    .await?;

    let insert = "INSERT INTO budgets (category, limit_amount, user_id) VALUES ('Food', 150.0, ?)";
    sqlx::query(insert).bind(user_id).execute(&pool).await?;

    let err = sqlx::query(insert)
        .bind(user_id)
        .execute(&pool)
        .await
        .map_err(common::error::DatabaseError::from)
        .unwrap_err();
    assert!(err.is_integrity_violation());

    Ok(())
}
