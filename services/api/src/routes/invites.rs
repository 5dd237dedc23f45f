//! Dependent invitations
//!
//! A parent asks for a signed invite token, shares the link, and the invitee
//! redeems it to create an account attached to that parent. The dependent cap
//! is checked when the token is issued, inspected and redeemed.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    error::{ApiError, ApiResult},
    models::{NewUser, User},
    routes::auth::TokenResponse,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub invite_token: String,
    pub invite_link: String,
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub struct InviteQuery {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct InviteInfo {
    pub valid: bool,
    pub parent_username: String,
    pub dependents_count: i64,
    pub remaining_slots: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDependentRequest {
    pub token: String,
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

fn invite_parent_id(state: &AppState, token: &str) -> ApiResult<i64> {
    state.jwt_service.validate_invite_token(token).map_err(|e| {
        debug!("Rejected invite token: {}", e);
        ApiError::BadRequest("Invalid or expired invite".to_string())
    })
}

/// Issue an invite for the caller's family
pub async fn create_invite(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<impl IntoResponse> {
    if user.parent_id.is_some() {
        return Err(ApiError::Forbidden(
            "Only independent accounts can invite dependents".to_string(),
        ));
    }
    if state.identity.remaining_slots(user.id).await? == 0 {
        return Err(ApiError::BadRequest(
            "Dependent limit reached: no invite slots left".to_string(),
        ));
    }

    let invite_token = state.jwt_service.generate_invite_token(user.id).map_err(|e| {
        error!("Failed to generate invite token: {}", e);
        ApiError::InternalServerError
    })?;
    info!("User {} issued an invite", user.username);

    Ok(Json(InviteResponse {
        invite_link: format!("{}/?invite={}", state.config.public_url, invite_token),
        invite_token,
        expires_in: state.jwt_service.invite_token_expiry(),
    }))
}

/// Describe an invite before it is redeemed
pub async fn invite_info(
    State(state): State<AppState>,
    Query(query): Query<InviteQuery>,
) -> ApiResult<impl IntoResponse> {
    let parent_id = invite_parent_id(&state, &query.token)?;
    let parent = state
        .user_repository
        .find_by_id(parent_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired invite".to_string()))?;

    let remaining_slots = state.identity.remaining_slots(parent.id).await?;
    if remaining_slots == 0 {
        return Err(ApiError::BadRequest(
            "This family has no dependent slots left".to_string(),
        ));
    }

    Ok(Json(InviteInfo {
        valid: true,
        parent_username: parent.username,
        dependents_count: crate::identity::MAX_DEPENDENTS - remaining_slots,
        remaining_slots,
    }))
}

/// Redeem an invite and sign the new dependent in
pub async fn register_dependent(
    State(state): State<AppState>,
    Json(payload): Json<RegisterDependentRequest>,
) -> ApiResult<impl IntoResponse> {
    let parent_id = invite_parent_id(&state, &payload.token)?;

    let mut new_user = NewUser::independent(payload.username, payload.password);
    new_user.email = payload.email;
    new_user.full_name = payload.full_name;
    new_user.phone = payload.phone;

    let user = state
        .identity
        .register_dependent(parent_id, new_user)
        .await?;
    info!("Registered dependent {} under {}", user.username, parent_id);

    Ok((StatusCode::CREATED, Json(TokenResponse::issue(&state, user)?)))
}
