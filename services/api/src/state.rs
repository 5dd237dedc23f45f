//! Application state shared across handlers

use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    config::AppConfig,
    identity::IdentityService,
    jwt::JwtService,
    passwords::{PasswordError, PasswordService},
    repositories::{
        BudgetRepository, CategoryRepository, ProfileRepository, TransactionRepository,
        UserRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub jwt_service: JwtService,
    pub identity: IdentityService,
    pub user_repository: UserRepository,
    pub transaction_repository: TransactionRepository,
    pub budget_repository: BudgetRepository,
    pub category_repository: CategoryRepository,
    pub profile_repository: ProfileRepository,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: SqlitePool, config: Arc<AppConfig>) -> Result<Self, PasswordError> {
        let passwords = PasswordService::new(&config.hashing)?;
        let user_repository = UserRepository::new(pool.clone());

        Ok(AppState {
            jwt_service: JwtService::new(config.jwt.clone()),
            identity: IdentityService::new(user_repository.clone(), passwords),
            user_repository,
            transaction_repository: TransactionRepository::new(pool.clone()),
            budget_repository: BudgetRepository::new(pool.clone()),
            category_repository: CategoryRepository::new(pool.clone()),
            profile_repository: ProfileRepository::new(pool.clone()),
            db_pool: pool,
            config,
        })
    }
}
