//! PostgreSQL implementation of the account store.

use async_trait::async_trait;
use sqlx::postgres::PgPool;
use time::OffsetDateTime;

use keygate_auth::error::AuthError;
use keygate_auth::storage::{Account, AccountStore, clamp_page};
use keygate_auth::AuthResult;

/// Database row for an account.
type AccountRow = (
    String,                 // id
    String,                 // email
    String,                 // password_hash
    Option<String>,         // name
    Option<String>,         // nickname
    Option<String>,         // picture
    OffsetDateTime,         // created_at
    OffsetDateTime,         // updated_at
    bool,                   // verified
    bool,                   // blocked
);

fn account_from_row(row: AccountRow) -> Account {
    Account {
        id: row.0,
        email: row.1,
        password_hash: row.2,
        name: row.3,
        nickname: row.4,
        picture: row.5,
        created_at: row.6,
        updated_at: row.7,
        verified: row.8,
        blocked: row.9,
    }
}

/// Maps a sqlx failure onto the engine's error vocabulary.
fn map_sqlx_error(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AuthError::already_exists("account id or email already exists")
        }
        _ => AuthError::storage(format!("postgres operation failed: {err}")),
    }
}

const SELECT_COLUMNS: &str = "id, email, password_hash, name, nickname, picture, \
     created_at, updated_at, verified, blocked";

/// PostgreSQL [`AccountStore`] backend.
///
/// Owns a connection pool; each operation checks out one connection for
/// the duration of a single statement.
#[derive(Clone)]
pub struct PostgresAccountStore {
    pool: PgPool,
}

impl PostgresAccountStore {
    /// Creates a store over an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for PostgresAccountStore {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts
                (id, email, password_hash, name, nickname, picture,
                 created_at, updated_at, verified, blocked)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.nickname)
        .bind(&account.picture)
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.verified)
        .bind(account.blocked)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        tracing::debug!(account_id = %account.id, "account created");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(account_from_row))
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(account_from_row))
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = $2, password_hash = $3, name = $4, nickname = $5,
                picture = $6, verified = $7, blocked = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.name)
        .bind(&account.nickname)
        .bind(&account.picture)
        .bind(account.verified)
        .bind(account.blocked)
        .bind(OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::not_found(format!(
                "account {} not found",
                account.id
            )));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> AuthResult<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::not_found(format!("account {id} not found")));
        }
        Ok(())
    }

    async fn list(&self, limit: i64, offset: i64) -> AuthResult<Vec<Account>> {
        let (limit, offset) = clamp_page(limit, offset);

        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(account_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_mapping() {
        let now = OffsetDateTime::now_utc();
        let row: AccountRow = (
            "id-1".to_string(),
            "a@x".to_string(),
            "$2b$10$hash".to_string(),
            Some("A".to_string()),
            None,
            None,
            now,
            now,
            true,
            false,
        );

        let account = account_from_row(row);
        assert_eq!(account.id, "id-1");
        assert_eq!(account.email, "a@x");
        assert_eq!(account.password_hash, "$2b$10$hash");
        assert_eq!(account.name.as_deref(), Some("A"));
        assert!(account.nickname.is_none());
        assert!(account.verified);
        assert!(!account.blocked);
    }

    #[test]
    fn test_non_database_errors_map_to_storage() {
        let err = map_sqlx_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AuthError::Storage { .. }));
    }
}
