//! Legacy single-profile storage

use common::error::DatabaseResult;
use sqlx::SqlitePool;

use crate::models::Profile;

#[derive(Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The first profile row, if any
    pub async fn get(&self) -> DatabaseResult<Option<Profile>> {
        let profile =
            sqlx::query_as::<_, Profile>("SELECT id, name, password FROM profile ORDER BY id LIMIT 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(profile)
    }

    pub async fn create(&self, name: &str, password_hash: Option<&str>) -> DatabaseResult<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profile (name, password) VALUES (?, ?) RETURNING id, name, password",
        )
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }

    pub async fn update(&self, profile: &Profile) -> DatabaseResult<Profile> {
        let profile = sqlx::query_as::<_, Profile>(
            "UPDATE profile SET name = ?, password = ? WHERE id = ? RETURNING id, name, password",
        )
        .bind(&profile.name)
        .bind(&profile.password)
        .bind(profile.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(profile)
    }
}
