//! User model and related functionality

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Subadmin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Subadmin => "subadmin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted role is not one of the known roles
#[derive(Debug, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "subadmin" => Ok(Role::Subadmin),
            "user" => Ok(Role::User),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub is_subscriber: bool,
    pub parent_id: Option<i64>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub currency: String,
    pub created_at: NaiveDateTime,
}

fn default_currency() -> String {
    "COP".to_string()
}

fn default_true() -> bool {
    true
}

/// New user creation payload (admin surface)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_true")]
    pub is_subscriber: bool,
    pub parent_id: Option<i64>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_role() -> Role {
    Role::User
}

impl NewUser {
    /// Minimal independent account, as created by self-registration
    pub fn independent(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            email: None,
            role: Role::User,
            is_active: true,
            is_subscriber: true,
            parent_id: None,
            full_name: None,
            phone: None,
            birth_date: None,
            currency: default_currency(),
        }
    }
}

/// Self-registration payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub currency: Option<String>,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        let mut user = NewUser::independent(req.username, req.password);
        user.email = req.email;
        user.full_name = req.full_name;
        user.phone = req.phone;
        user.birth_date = req.birth_date;
        if let Some(currency) = req.currency {
            user.currency = currency;
        }
        user
    }
}

/// User update payload. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub is_subscriber: Option<bool>,
    pub parent_id: Option<i64>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub currency: Option<String>,
}

impl UserUpdate {
    /// Columns an update may touch. `password` is hashed by the identity
    /// store and written to `password_hash`.
    pub const FIELDS: &'static [&'static str] = &[
        "username",
        "email",
        "password",
        "role",
        "is_active",
        "is_subscriber",
        "parent_id",
        "full_name",
        "phone",
        "birth_date",
        "currency",
    ];

    /// Copy every present field onto `user`, returning the names of the
    /// fields that were applied. The password is not handled here.
    pub fn merge_into(&self, user: &mut User) -> Vec<&'static str> {
        let mut applied = Vec::new();

        if let Some(username) = &self.username {
            user.username = username.clone();
            applied.push("username");
        }
        if let Some(email) = &self.email {
            user.email = Some(email.clone());
            applied.push("email");
        }
        if let Some(role) = self.role {
            user.role = role;
            applied.push("role");
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
            applied.push("is_active");
        }
        if let Some(is_subscriber) = self.is_subscriber {
            user.is_subscriber = is_subscriber;
            applied.push("is_subscriber");
        }
        if let Some(parent_id) = self.parent_id {
            user.parent_id = Some(parent_id);
            applied.push("parent_id");
        }
        if let Some(full_name) = &self.full_name {
            user.full_name = Some(full_name.clone());
            applied.push("full_name");
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
            applied.push("phone");
        }
        if let Some(birth_date) = self.birth_date {
            user.birth_date = Some(birth_date);
            applied.push("birth_date");
        }
        if let Some(currency) = &self.currency {
            user.currency = currency.clone();
            applied.push("currency");
        }

        applied
    }
}

/// Fields a user may change on their own account
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProfileFieldsUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub currency: Option<String>,
}

impl From<ProfileFieldsUpdate> for UserUpdate {
    fn from(update: ProfileFieldsUpdate) -> Self {
        UserUpdate {
            email: update.email,
            full_name: update.full_name,
            phone: update.phone,
            birth_date: update.birth_date,
            currency: update.currency,
            ..UserUpdate::default()
        }
    }
}

/// User login credentials, posted as a form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Admin, Role::Subadmin, Role::User] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn merge_applies_only_present_fields() {
        let mut user = fixtures::user(7, Role::User, None);
        let update = UserUpdate {
            full_name: Some("Ana Maria".to_string()),
            currency: Some("BRL".to_string()),
            ..UserUpdate::default()
        };

        let applied = update.merge_into(&mut user);

        assert_eq!(applied, vec!["full_name", "currency"]);
        assert_eq!(user.full_name.as_deref(), Some("Ana Maria"));
        assert_eq!(user.currency, "BRL");
        assert_eq!(user.username, "user7");
        assert!(user.is_active);
    }

    #[test]
    fn every_applied_field_is_declared() {
        let mut user = fixtures::user(1, Role::User, None);
        let update = UserUpdate {
            username: Some("x".into()),
            email: Some("x@y.io".into()),
            role: Some(Role::Subadmin),
            is_active: Some(false),
            is_subscriber: Some(false),
            parent_id: Some(3),
            full_name: Some("X".into()),
            phone: Some("1".into()),
            birth_date: NaiveDate::from_ymd_opt(2000, 2, 29),
            currency: Some("USD".into()),
            password: None,
        };

        for field in update.merge_into(&mut user) {
            assert!(UserUpdate::FIELDS.contains(&field));
        }
    }

    #[test]
    fn profile_update_cannot_touch_role() {
        let update: UserUpdate = ProfileFieldsUpdate {
            phone: Some("555".into()),
            ..ProfileFieldsUpdate::default()
        }
        .into();

        assert!(update.role.is_none());
        assert!(update.parent_id.is_none());
        assert_eq!(update.phone.as_deref(), Some("555"));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let mut user = fixtures::user(1, Role::Admin, None);
        user.password_hash = "secret-hash".to_string();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
    }
}
