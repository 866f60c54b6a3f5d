//! Environment-driven server configuration.

use std::env;

/// Minimum length of the token secret, in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Which account store backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process map behind a readers-writer lock.
    Memory,
    /// PostgreSQL via a bounded connection pool.
    Postgres,
}

/// Configuration loading errors. Any of these is a startup failure and
/// the process exits non-zero.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOKEN_SECRET is not set.
    #[error("TOKEN_SECRET is required")]
    MissingSecret,

    /// TOKEN_SECRET is too short to derive keys from.
    #[error("TOKEN_SECRET must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    WeakSecret(usize),

    /// ACCOUNT_STORE names an unknown backend.
    #[error("unknown ACCOUNT_STORE: {0} (expected \"memory\" or \"postgres\")")]
    UnknownStore(String),

    /// DATABASE_URL is required when the postgres backend is selected.
    #[error("DATABASE_URL is required when ACCOUNT_STORE=postgres")]
    MissingDatabaseUrl,

    /// A numeric variable failed to parse.
    #[error("invalid value for {key}: {value}")]
    InvalidValue {
        /// The environment variable.
        key: &'static str,
        /// The offending value.
        value: String,
    },
}

/// Server configuration, loaded from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (`SERVER_ADDRESS`, default `0.0.0.0:8080`).
    pub address: String,

    /// Issuer string (`ISSUER`, default `keygate`).
    pub issuer: String,

    /// Public domain for discovery URLs (`DOMAIN`, default
    /// `localhost:8080`).
    pub domain: String,

    /// Secret material for token keys (`TOKEN_SECRET`, required,
    /// at least 32 bytes).
    pub token_secret: String,

    /// Selected account store backend (`ACCOUNT_STORE`, default memory).
    pub store: StoreBackend,

    /// PostgreSQL connection string (`DATABASE_URL`).
    pub database_url: Option<String>,

    /// Connection pool ceiling (`DATABASE_MAX_CONNECTIONS`, default 10).
    pub database_max_connections: u32,

    /// Access token lifetime in seconds (`ACCESS_TOKEN_TTL_SECS`,
    /// default 86400).
    pub access_token_ttl_secs: i64,

    /// Refresh token lifetime in seconds (`REFRESH_TOKEN_TTL_SECS`,
    /// default 604800).
    pub refresh_token_ttl_secs: i64,

    /// Authorization code lifetime in seconds (`CODE_TTL_SECS`,
    /// default 600).
    pub code_ttl_secs: i64,

    /// bcrypt cost (`PASSWORD_HASH_COST`, default 10).
    pub password_hash_cost: u32,
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on a missing or weak secret, an unknown
    /// store selector, a missing database URL for the relational store,
    /// or an unparseable numeric value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let token_secret = env::var("TOKEN_SECRET").map_err(|_| ConfigError::MissingSecret)?;
        if token_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret(token_secret.len()));
        }

        let store = match env::var("ACCOUNT_STORE").as_deref() {
            Err(_) | Ok("") | Ok("memory") => StoreBackend::Memory,
            Ok("postgres") => StoreBackend::Postgres,
            Ok(other) => return Err(ConfigError::UnknownStore(other.to_string())),
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        if store == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Self {
            address: env_or("SERVER_ADDRESS", "0.0.0.0:8080"),
            issuer: env_or("ISSUER", "keygate"),
            domain: env_or("DOMAIN", "localhost:8080"),
            token_secret,
            store,
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            access_token_ttl_secs: parse_env("ACCESS_TOKEN_TTL_SECS", 86_400)?,
            refresh_token_ttl_secs: parse_env("REFRESH_TOKEN_TTL_SECS", 604_800)?,
            code_ttl_secs: parse_env("CODE_TTL_SECS", 600)?,
            password_hash_cost: parse_env("PASSWORD_HASH_COST", 10)?,
        })
    }

    /// The public base URL advertised in the discovery document.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.domain.contains("://") {
            self.domain.clone()
        } else {
            format!("http://{}", self.domain)
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(value) if value.is_empty() => Ok(default),
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
