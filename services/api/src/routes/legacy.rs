//! Single-profile endpoints kept for old clients

use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    identity::IdentityError,
    middleware::require_admin,
    models::{LegacyLogin, Profile, ProfileUpdate, User},
    state::AppState,
};

const DEFAULT_PROFILE_NAME: &str = "admin";
const DEFAULT_PROFILE_PASSWORD: &str = "1234";

fn hash(state: &AppState, password: &str) -> ApiResult<String> {
    state.identity.passwords().hash(password).map_err(|e| {
        error!("Failed to hash profile password: {}", e);
        ApiError::InternalServerError
    })
}

async fn load_or_create(state: &AppState) -> ApiResult<Profile> {
    if let Some(profile) = state.profile_repository.get().await? {
        return Ok(profile);
    }

    info!("Creating default legacy profile");
    let password = hash(state, DEFAULT_PROFILE_PASSWORD)?;
    Ok(state
        .profile_repository
        .create(DEFAULT_PROFILE_NAME, Some(&password))
        .await?)
}

pub async fn read_profile(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(load_or_create(&state).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ProfileUpdate>,
) -> ApiResult<impl IntoResponse> {
    require_admin(&user)?;

    let mut profile = load_or_create(&state).await?;
    profile.name = payload.name;
    if let Some(password) = payload.password.as_deref() {
        profile.password = Some(hash(&state, password)?);
    }

    Ok(Json(state.profile_repository.update(&profile).await?))
}

/// Try the account store first, then the legacy profile
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LegacyLogin>,
) -> ApiResult<impl IntoResponse> {
    match state
        .identity
        .authenticate(&payload.name, &payload.password)
        .await
    {
        Ok(user) => {
            let access_token = state.jwt_service.generate_access_token(&user).map_err(|e| {
                error!("Failed to generate access token: {}", e);
                ApiError::InternalServerError
            })?;
            return Ok(Json(json!({
                "ok": true,
                "name": user.username,
                "access_token": access_token,
                "token_type": "bearer",
                "role": user.role,
            })));
        }
        Err(IdentityError::InvalidCredentials | IdentityError::InactiveAccount) => {}
        Err(e) => return Err(e.into()),
    }

    let profile = state.profile_repository.get().await?;
    let matches = profile.is_some_and(|p| {
        p.name.to_lowercase() == payload.name.to_lowercase()
            && p
                .password
                .as_deref()
                .is_some_and(|hash| state.identity.passwords().verify(&payload.password, hash))
    });

    if !matches {
        return Err(ApiError::AuthenticationFailed(
            "Incorrect credentials".to_string(),
        ));
    }

    Ok(Json(json!({
        "ok": true,
        "name": payload.name,
        "role": "admin",
    })))
}
