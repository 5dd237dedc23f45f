//! Identity store: accounts, credentials and the dependent hierarchy

use common::error::DatabaseError;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    models::{NewUser, Role, User, UserUpdate},
    passwords::{PasswordError, PasswordService},
    repositories::UserRepository,
    validation::{validate_email, validate_password, validate_username},
};

/// Most dependents a single parent account may have
pub const MAX_DEPENDENTS: i64 = 4;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Inactive account")]
    InactiveAccount,

    #[error("User not found")]
    NotFound,

    #[error("Dependent limit reached: a parent may have at most {MAX_DEPENDENTS} dependents")]
    DependentLimitExceeded,

    #[error("Parent account not found")]
    ParentNotFound,

    #[error("A dependent account cannot have dependents")]
    ParentIsDependent,

    #[error("An account with dependents cannot become a dependent")]
    HasDependents,

    #[error("Username already exists")]
    DuplicateUsername,

    #[error("Email already exists")]
    DuplicateEmail,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Hash(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Account management on top of the user repository
#[derive(Clone)]
pub struct IdentityService {
    users: UserRepository,
    passwords: PasswordService,
}

impl IdentityService {
    pub fn new(users: UserRepository, passwords: PasswordService) -> Self {
        Self { users, passwords }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    pub fn passwords(&self) -> &PasswordService {
        &self.passwords
    }

    /// Check credentials. Unknown users and wrong passwords are indistinguishable.
    pub async fn authenticate(&self, username: &str, password: &str) -> IdentityResult<User> {
        let Some(user) = self.users.find_by_username(username).await? else {
            self.passwords.verify_missing(password);
            return Err(IdentityError::InvalidCredentials);
        };

        if !self.passwords.verify(password, &user.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(IdentityError::InactiveAccount);
        }

        Ok(user)
    }

    pub async fn create_user(&self, mut new_user: NewUser) -> IdentityResult<User> {
        new_user.email = new_user.email.filter(|e| !e.trim().is_empty());

        validate_username(&new_user.username).map_err(IdentityError::Validation)?;
        validate_password(&new_user.password).map_err(IdentityError::Validation)?;
        if let Some(email) = &new_user.email {
            validate_email(email).map_err(IdentityError::Validation)?;
        }

        self.ensure_username_free(&new_user.username).await?;
        if let Some(email) = &new_user.email {
            self.ensure_email_free(email).await?;
        }
        if let Some(parent_id) = new_user.parent_id {
            self.ensure_parent_accepts(parent_id).await?;
        }

        let hash = self.passwords.hash(&new_user.password)?;
        let user = self.users.create(&new_user, &hash).await?;
        info!("Created user {} ({})", user.username, user.role);

        Ok(user)
    }

    /// Register a plain account under `parent_id`
    pub async fn register_dependent(
        &self,
        parent_id: i64,
        mut new_user: NewUser,
    ) -> IdentityResult<User> {
        new_user.parent_id = Some(parent_id);
        new_user.role = Role::User;
        self.create_user(new_user).await
    }

    /// Free dependent slots left for `parent_id`
    pub async fn remaining_slots(&self, parent_id: i64) -> IdentityResult<i64> {
        let count = self.users.count_dependents(parent_id).await?;
        Ok((MAX_DEPENDENTS - count).max(0))
    }

    /// Merge the present fields of `update` onto the stored account
    pub async fn update_user(&self, id: i64, update: UserUpdate) -> IdentityResult<User> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound)?;

        if let Some(username) = &update.username {
            if *username != user.username {
                validate_username(username).map_err(IdentityError::Validation)?;
                self.ensure_username_free(username).await?;
            }
        }
        if let Some(email) = &update.email {
            if user.email.as_deref() != Some(email.as_str()) {
                validate_email(email).map_err(IdentityError::Validation)?;
                self.ensure_email_free(email).await?;
            }
        }
        if let Some(parent_id) = update.parent_id {
            if parent_id == id {
                return Err(IdentityError::Validation(
                    "An account cannot be its own parent".to_string(),
                ));
            }
            if user.parent_id != Some(parent_id) {
                if self.users.count_dependents(id).await? > 0 {
                    return Err(IdentityError::HasDependents);
                }
                self.ensure_parent_accepts(parent_id).await?;
            }
        }

        let applied = update.merge_into(&mut user);
        if let Some(password) = &update.password {
            validate_password(password).map_err(IdentityError::Validation)?;
            user.password_hash = self.passwords.hash(password)?;
        }
        info!("Updating user {}: {:?}", id, applied);

        Ok(self.users.update(&user).await?)
    }

    /// Flip the active flag
    pub async fn toggle_active(&self, id: i64) -> IdentityResult<User> {
        let mut user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(IdentityError::NotFound)?;

        user.is_active = !user.is_active;
        info!("User {} active: {}", id, user.is_active);

        Ok(self.users.update(&user).await?)
    }

    /// Delete an account, its dependents and everything they own
    pub async fn delete_user(&self, id: i64) -> IdentityResult<()> {
        if !self.users.delete_cascade(id).await? {
            return Err(IdentityError::NotFound);
        }
        Ok(())
    }

    /// Create the `admin` account on an empty database
    pub async fn ensure_default_admin(&self, password: &str) -> IdentityResult<Option<User>> {
        if self.users.count().await? > 0 {
            return Ok(None);
        }

        warn!("No users found, creating default admin account");
        let mut admin = NewUser::independent("admin", password);
        admin.email = Some("admin@localhost".to_string());
        admin.role = Role::Admin;
        admin.full_name = Some("Administrator".to_string());

        self.create_user(admin).await.map(Some)
    }

    async fn ensure_username_free(&self, username: &str) -> IdentityResult<()> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(IdentityError::DuplicateUsername);
        }
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str) -> IdentityResult<()> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(IdentityError::DuplicateEmail);
        }
        Ok(())
    }

    async fn ensure_parent_accepts(&self, parent_id: i64) -> IdentityResult<()> {
        let parent = self
            .users
            .find_by_id(parent_id)
            .await?
            .ok_or(IdentityError::ParentNotFound)?;

        if parent.parent_id.is_some() {
            return Err(IdentityError::ParentIsDependent);
        }
        if self.users.count_dependents(parent_id).await? >= MAX_DEPENDENTS {
            return Err(IdentityError::DependentLimitExceeded);
        }
        Ok(())
    }
}
