//! Legacy single-profile model, kept for old clients

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Profile update payload
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub password: Option<String>,
}

/// Legacy login payload
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyLogin {
    pub name: String,
    pub password: String,
}
