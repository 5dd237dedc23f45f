//! Login and self-registration

use axum::{Form, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    models::{LoginCredentials, NewUser, RegisterRequest, User},
    state::AppState,
};

/// Response for token generation
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: User,
}

impl TokenResponse {
    /// Issue an access token for `user`
    pub fn issue(state: &AppState, user: User) -> ApiResult<Self> {
        let access_token = state.jwt_service.generate_access_token(&user).map_err(|e| {
            error!("Failed to generate access token: {}", e);
            ApiError::InternalServerError
        })?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: state.jwt_service.access_token_expiry(),
            user,
        })
    }
}

/// User login endpoint, credentials posted as a form
pub async fn login(
    State(state): State<AppState>,
    Form(credentials): Form<LoginCredentials>,
) -> ApiResult<impl IntoResponse> {
    info!("Login attempt for user: {}", credentials.username);

    let user = state
        .identity
        .authenticate(&credentials.username, &credentials.password)
        .await?;

    Ok(Json(TokenResponse::issue(&state, user)?))
}

/// Self-registration of an independent account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.identity.create_user(NewUser::from(payload)).await?;

    Ok((StatusCode::CREATED, Json(user)))
}
