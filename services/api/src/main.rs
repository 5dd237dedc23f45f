use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::database::{health_check, init_pool, run_migrations};
use finance_api::{AppConfig, AppState, app};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting finance API service");

    let config = Arc::new(AppConfig::from_env()?);

    // Initialize database connection pool
    let pool = init_pool(&config.database).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let state = AppState::new(pool, config.clone())?;

    if let Some(admin) = state
        .identity
        .ensure_default_admin(&config.admin_default_password)
        .await?
    {
        info!("Created bootstrap account {}", admin.username);
    }
    if config.uses_default_admin_password() {
        warn!("ADMIN_DEFAULT_PASSWORD is not set, the bootstrap admin uses the built-in password");
    }

    // Start the web server
    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("Finance API listening on {}", config.bind_address);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
