//! Finance service models

pub mod budget;
pub mod category;
pub mod profile;
pub mod transaction;
pub mod user;

// Re-export for convenience
pub use budget::{Budget, BudgetUpdate, NewBudget};
pub use category::{Category, CategoryPayload};
pub use profile::{LegacyLogin, Profile, ProfileUpdate};
pub use transaction::{NewTransaction, Transaction, TransactionKind, TransactionUpdate};
pub use user::{
    LoginCredentials, NewUser, ProfileFieldsUpdate, RegisterRequest, Role, User, UserUpdate,
};
