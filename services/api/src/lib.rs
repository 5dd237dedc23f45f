//! Family finance API
//!
//! Accounts with a parent/dependent hierarchy, a per-family ledger of
//! transactions, budgets and categories, recurring transaction templates and
//! reporting, served over HTTP with bearer-token authentication.

pub mod config;
pub mod error;
pub mod identity;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod passwords;
pub mod policy;
pub mod recurring;
pub mod reports;
pub mod repositories;
pub mod routes;
pub mod search;
pub mod state;
pub mod validation;

use axum::Router;

pub use config::AppConfig;
pub use state::AppState;

/// Build the complete application router
pub fn app(state: AppState) -> Router {
    routes::create_router(state)
}
