//! In-memory account store.
//!
//! A readers-writer lock over a plain map: reads proceed in parallel,
//! writes take the lock exclusively. Values are cloned on the way in and
//! out, so callers can never alias stored state.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::storage::{Account, AccountStore, clamp_page};

/// In-memory [`AccountStore`] backend.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    /// Returns `true` if the store holds no accounts.
    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.write().await;

        if accounts.contains_key(&account.id) {
            return Err(AuthError::already_exists(format!(
                "account id {} already exists",
                account.id
            )));
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AuthError::already_exists(format!(
                "account email {} already exists",
                account.email
            )));
        }

        accounts.insert(account.id.clone(), account.clone());
        tracing::debug!(account_id = %account.id, "account created");
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Account>> {
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .await
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        let mut accounts = self.accounts.write().await;

        let existing = accounts
            .get_mut(&account.id)
            .ok_or_else(|| AuthError::not_found(format!("account {} not found", account.id)))?;

        existing.email = account.email.clone();
        existing.password_hash = account.password_hash.clone();
        existing.name = account.name.clone();
        existing.nickname = account.nickname.clone();
        existing.picture = account.picture.clone();
        existing.verified = account.verified;
        existing.blocked = account.blocked;
        existing.updated_at = OffsetDateTime::now_utc();

        Ok(())
    }

    async fn delete(&self, id: &str) -> AuthResult<()> {
        let mut accounts = self.accounts.write().await;
        accounts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AuthError::not_found(format!("account {id} not found")))
    }

    async fn list(&self, limit: i64, offset: i64) -> AuthResult<Vec<Account>> {
        let (limit, offset) = clamp_page(limit, offset);

        let accounts = self.accounts.read().await;
        let mut all: Vec<Account> = accounts.values().cloned().collect();
        // Newest first; id as tie-breaker for a deterministic order.
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(all
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }
}
