//! PostgreSQL account store for the Keygate authorization server.
//!
//! Each [`keygate_auth::AccountStore`] operation maps to a single
//! parameterized statement. Connections come from a bounded pool; a
//! request checks out at most one connection per operation and releases
//! it on every exit path (sqlx guarantees this through `Drop`).

mod account;

pub use account::PostgresAccountStore;
pub use sqlx::postgres::PgPool;

use keygate_auth::AuthError;
use sqlx::postgres::PgPoolOptions;

/// Schema bootstrap for the accounts table.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    name          TEXT,
    nickname      TEXT,
    picture       TEXT,
    created_at    TIMESTAMPTZ NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL,
    verified      BOOLEAN NOT NULL DEFAULT FALSE,
    blocked       BOOLEAN NOT NULL DEFAULT FALSE
)
"#;

/// Connects to PostgreSQL with a bounded connection pool.
///
/// # Errors
///
/// Returns `Storage` if the database is unreachable; the server treats
/// this as a startup failure when the relational store is selected.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, AuthError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| AuthError::storage(format!("failed to connect to postgres: {e}")))
}

/// Creates the accounts table if it does not exist.
///
/// # Errors
///
/// Returns `Storage` if the statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AuthError> {
    sqlx::query(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| AuthError::storage(format!("failed to create schema: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_enforces_uniqueness() {
        assert!(SCHEMA.contains("PRIMARY KEY"));
        assert!(SCHEMA.contains("UNIQUE"));
        assert!(SCHEMA.contains("IF NOT EXISTS"));
    }
}
