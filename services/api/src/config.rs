//! Service configuration
//!
//! Every tunable is read once at startup into an immutable [`AppConfig`]
//! which is then handed to the components that need it. Values come from
//! built-in defaults overlaid by process environment variables.

use common::database::{DEFAULT_DATABASE_URL, DatabaseConfig};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::{jwt::JwtConfig, passwords::HashingConfig};

/// Secret used when `SECRET_KEY` is not provided. Fine for local runs only.
pub const DEVELOPMENT_SECRET_KEY: &str = "agente-financeiro-secret-key-change-in-production";

/// Bootstrap admin password used when `ADMIN_DEFAULT_PASSWORD` is not provided
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Token signing settings
    pub jwt: JwtConfig,
    /// Password hashing cost
    pub hashing: HashingConfig,
    /// Password given to the `admin` account created on an empty database
    pub admin_default_password: String,
    /// Prefix for invite links handed to parents
    pub public_url: String,
}

/// Flat view of the environment, one field per variable
#[derive(Debug, Deserialize)]
struct Settings {
    bind_address: String,
    database_url: String,
    database_max_connections: u32,
    database_min_connections: u32,
    database_connection_timeout: u64,
    secret_key: String,
    access_token_ttl_hours: u64,
    invite_token_ttl_hours: u64,
    admin_default_password: String,
    public_url: String,
    argon2_memory_kib: u32,
    argon2_iterations: u32,
    argon2_parallelism: u32,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDRESS`: listen address (default: "0.0.0.0:8000")
    /// - `DATABASE_URL`: SQLite URL (default: "sqlite://data/financeiro.db")
    /// - `DATABASE_MAX_CONNECTIONS` / `DATABASE_MIN_CONNECTIONS` (default: 5 / 1)
    /// - `DATABASE_CONNECTION_TIMEOUT`: seconds (default: 30)
    /// - `SECRET_KEY`: HMAC secret for access and invite tokens
    /// - `ACCESS_TOKEN_TTL_HOURS` / `INVITE_TOKEN_TTL_HOURS` (default: 24 / 24)
    /// - `ADMIN_DEFAULT_PASSWORD`: bootstrap admin password (default: "admin123")
    /// - `PUBLIC_URL`: prefix for invite links (default: empty)
    /// - `ARGON2_MEMORY_KIB` / `ARGON2_ITERATIONS` / `ARGON2_PARALLELISM`
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = HashingConfig::default();

        let settings: Settings = Config::builder()
            .set_default("bind_address", "0.0.0.0:8000")?
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("database_max_connections", 5_i64)?
            .set_default("database_min_connections", 1_i64)?
            .set_default("database_connection_timeout", 30_i64)?
            .set_default("secret_key", DEVELOPMENT_SECRET_KEY)?
            .set_default("access_token_ttl_hours", 24_i64)?
            .set_default("invite_token_ttl_hours", 24_i64)?
            .set_default("admin_default_password", DEFAULT_ADMIN_PASSWORD)?
            .set_default("public_url", "")?
            .set_default("argon2_memory_kib", i64::from(defaults.memory_kib))?
            .set_default("argon2_iterations", i64::from(defaults.iterations))?
            .set_default("argon2_parallelism", i64::from(defaults.parallelism))?
            .add_source(Environment::default())
            .build()?
            .try_deserialize()?;

        if settings.secret_key.is_empty() {
            return Err(ConfigError::Message("SECRET_KEY must not be empty".to_string()));
        }

        Ok(AppConfig {
            bind_address: settings.bind_address,
            database: DatabaseConfig {
                database_url: settings.database_url,
                max_connections: settings.database_max_connections,
                min_connections: settings.database_min_connections,
                connection_timeout: settings.database_connection_timeout,
            },
            jwt: JwtConfig {
                secret_key: settings.secret_key,
                access_token_expiry: settings.access_token_ttl_hours * 3600,
                invite_token_expiry: settings.invite_token_ttl_hours * 3600,
            },
            hashing: HashingConfig {
                memory_kib: settings.argon2_memory_kib,
                iterations: settings.argon2_iterations,
                parallelism: settings.argon2_parallelism,
            },
            admin_default_password: settings.admin_default_password,
            public_url: settings.public_url.trim_end_matches('/').to_string(),
        })
    }

    /// True while the bootstrap admin still uses the built-in password
    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_default_password == DEFAULT_ADMIN_PASSWORD
    }
}
