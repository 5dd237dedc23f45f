//! Repositories for database operations

pub mod budget;
pub mod category;
pub mod profile;
pub mod transaction;
pub mod user;

pub use budget::BudgetRepository;
pub use category::CategoryRepository;
pub use profile::ProfileRepository;
pub use transaction::{PlannedInstance, TransactionFilter, TransactionRepository};
pub use user::UserRepository;
