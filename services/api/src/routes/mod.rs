//! API service routes

use axum::{
    Json, Router,
    extract::State,
    handler::Handler,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
};
use serde_json::json;

use crate::{middleware::auth_middleware, state::AppState};

pub mod analytics;
pub mod auth;
pub mod budgets;
pub mod categories;
pub mod invites;
pub mod legacy;
pub mod transactions;
pub mod users;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/users/me", get(users::read_me).put(users::update_me))
        .route("/users/dependents", get(users::list_dependents))
        .route("/users/", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/:id/toggle", patch(users::toggle_user))
        .route("/invite", post(invites::create_invite))
        .route(
            "/transactions/",
            get(transactions::list_transactions).post(transactions::create_transaction),
        )
        .route("/transactions/stats", get(transactions::transaction_stats))
        .route("/transactions/search", post(transactions::search_transactions))
        .route("/transactions/report", get(transactions::period_report))
        .route("/transactions/recurring/", get(transactions::list_recurring))
        .route(
            "/transactions/recurring/:id",
            delete(transactions::deactivate_recurring),
        )
        .route(
            "/transactions/apply-recurring/",
            post(transactions::apply_recurring),
        )
        .route(
            "/transactions/:id",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .route(
            "/budgets/",
            get(budgets::list_budgets).post(budgets::create_budget),
        )
        .route("/budgets/status/", get(budgets::budget_status))
        .route(
            "/budgets/:id",
            put(budgets::update_budget).delete(budgets::delete_budget),
        )
        .route(
            "/categories/",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/analytics/categories/", get(analytics::category_analytics))
        .route("/summary", get(analytics::legacy_summary))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/invite/info", get(invites::invite_info))
        .route("/register-dependent", post(invites::register_dependent))
        .route(
            "/profile",
            get(legacy::read_profile).put(legacy::update_profile.layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            )),
        )
        .route("/login", post(legacy::login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": if database { "ok" } else { "degraded" },
        "service": "finance-api",
        "database": database,
    }))
}
