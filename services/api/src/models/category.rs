//! Category model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Transaction category label, owned by a family root account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
}

/// New or renamed category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
}

impl CategoryPayload {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Category name is required".to_string());
        }
        Ok(())
    }
}
